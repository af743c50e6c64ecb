//! User-facing linear expressions `Σ sᵢ·Gᵢ` over [`Secret`] placeholders.
//!
//! An [`Expression`] is the surface a caller writes statements in:
//! `secret * generator + secret2 * generator2`. It mirrors
//! [`crate::linear_relation::LinearCombination`] one level up, keyed by
//! [`Secret`] identity rather than by pre-allocated [`crate::linear_relation::ScalarVar`]
//! indices; atomic statement constructors (`DLRep::new`, ...) translate an
//! `Expression` into a `LinearRelation`, allocating one scalar variable per
//! distinct `Secret` encountered.

use core::ops::{Add, Mul};

use group::Group;

use crate::secret::Secret;

/// A linear combination `Σ sᵢ·Gᵢ` of [`Secret`] placeholders and group
/// elements. No simplification is performed: a `Secret` that appears in two
/// terms keeps both terms (it is still the same witness scalar, but the
/// expression is not algebraically rewritten).
#[derive(Clone, Debug)]
pub struct Expression<G> {
    pub(crate) terms: Vec<(Secret, G)>,
}

impl<G> Expression<G> {
    /// An empty expression (the neutral element for `+`).
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// A single-term expression `secret * point`.
    pub fn term(secret: Secret, point: G) -> Self {
        Self {
            terms: vec![(secret, point)],
        }
    }

    pub fn terms(&self) -> &[(Secret, G)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<G> Default for Expression<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Group> Mul<G> for Secret {
    type Output = Expression<G>;

    fn mul(self, rhs: G) -> Expression<G> {
        Expression::term(self, rhs)
    }
}

impl<G: Group> Mul<G> for &Secret {
    type Output = Expression<G>;

    fn mul(self, rhs: G) -> Expression<G> {
        Expression::term(self.clone(), rhs)
    }
}

impl<G> Add for Expression<G> {
    type Output = Expression<G>;

    fn add(mut self, rhs: Expression<G>) -> Expression<G> {
        self.terms.extend(rhs.terms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::ristretto::RistrettoPoint as G;
    use curve25519_dalek::scalar::Scalar;
    use group::Group as _;
    use rand::rngs::OsRng;

    #[test]
    fn builder_sugar_concatenates_terms() {
        let mut rng = OsRng;
        let g1 = G::random(&mut rng);
        let g2 = G::random(&mut rng);
        let x = Secret::named("x");
        let y = Secret::named("y");

        let expr = x.clone() * g1 + y.clone() * g2;
        assert_eq!(expr.terms().len(), 2);
        assert_eq!(expr.terms()[0].0, x);
        assert_eq!(expr.terms()[1].0, y);
        let _ = Scalar::ONE;
    }
}
