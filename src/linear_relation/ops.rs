//! Operator sugar for building [`LinearCombination`]s out of
//! [`ScalarVar`]/[`GroupVar`] indices: `scalar_var * group_var + ...`.
//!
//! This is the low-level half of the `s * G + s' * G'` builder surface;
//! [`crate::expression`] layers the user-facing [`crate::secret::Secret`]-keyed
//! version of the same sugar on top.

use core::ops::Add;

use super::{GroupVar, LinearCombination, ScalarVar, Term};

mod mul {
    use super::*;
    use core::ops::Mul;

    impl Mul<GroupVar> for ScalarVar {
        type Output = Term;

        fn mul(self, rhs: GroupVar) -> Term {
            Term::from((self, rhs))
        }
    }

    impl Mul<ScalarVar> for GroupVar {
        type Output = Term;

        fn mul(self, rhs: ScalarVar) -> Term {
            Term::from((rhs, self))
        }
    }
}

impl Add<Term> for Term {
    type Output = LinearCombination;

    fn add(self, rhs: Term) -> LinearCombination {
        LinearCombination(vec![self, rhs])
    }
}

impl Add<Term> for LinearCombination {
    type Output = LinearCombination;

    fn add(mut self, rhs: Term) -> LinearCombination {
        self.0.push(rhs);
        self
    }
}

impl Add<LinearCombination> for LinearCombination {
    type Output = LinearCombination;

    fn add(mut self, rhs: LinearCombination) -> LinearCombination {
        self.0.extend(rhs.0);
        self
    }
}
