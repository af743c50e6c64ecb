//! `DLRepNotEqual`: proof that two discrete logs are *different*,
//! `x₀ ≠ x₁` for `Y₀ = x₀·G₀`, `Y₁ = x₁·G₁`, knowing only `x₀` (called `x`
//! below) and with `x₁`'s secret kept implicit in the public pair `(Y₁,G₁)`.
//!
//! Only the single-secret form is implemented: the prover knows `x` and
//! wants to show `x ≠ x₁` without knowing `x₁` or revealing `x`. The
//! two-secret `[x₀, x₁]` variant some write-ups describe is out of scope
//! here (see the design ledger).
//!
//! Construction (a precommitment plus two linear equations sharing a single
//! Schnorr proof):
//! - Precommit: sample `α ← Zq \ {0}`, publish `C = α·(x·G₁ − Y₁)`.
//! - Knowledge of `(x, α)` such that `Y₀ = x·G₀` and
//!   `−C = α·Y₁ + β·G₁` where `β := −x·α`.
//! - Verify additionally requires `C ≠ 0`: if `x = x₁` then
//!   `x·G₁ − Y₁ = 0`, forcing `C = 0` regardless of `α`, so a cheating
//!   prover with `x = x₁` cannot produce a nonzero `C` and pass both checks.

use group::{Group, GroupEncoding};
use rand::{CryptoRng, RngCore};

use crate::errors::Error;
use crate::linear_relation::LinearRelation;
use crate::schnorr_protocol::SchnorrProof;
use crate::secret::Secret;
use crate::traits::{SigmaProtocol, SigmaProtocolSimulator};

/// The public statement: `Y0 = x·G0`, `x ≠ x1` where `Y1 = x1·G1`.
#[derive(Clone, Debug)]
pub struct DLRepNotEqual<G: Group + GroupEncoding> {
    y0: G,
    g0: G,
    y1: G,
    g1: G,
    x: Secret,
    /// Whether `x`'s response must be kept in lockstep with sibling
    /// statements that also bind it (enforced by the containing `AndProof`,
    /// not by this type itself).
    binding: bool,
}

/// The statement together with its precommitment `C`, from which both the
/// prover and the verifier derive the same internal two-equation relation.
#[derive(Clone, Debug)]
pub struct DLRepNotEqualInstance<G: Group + GroupEncoding> {
    stmt: DLRepNotEqual<G>,
    c: G,
}

impl<G: Group + GroupEncoding> DLRepNotEqual<G> {
    pub fn new(y0: G, g0: G, y1: G, g1: G, x: Secret, binding: bool) -> Self {
        Self {
            y0,
            g0,
            y1,
            g1,
            x,
            binding,
        }
    }

    pub fn x(&self) -> &Secret {
        &self.x
    }

    pub fn binding(&self) -> bool {
        self.binding
    }

    /// Prover-side precommitment: samples `alpha` and publishes `C`.
    pub fn precommit(
        &self,
        x_value: G::Scalar,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> (G, G::Scalar) {
        use ff::Field;
        let mut alpha = G::Scalar::random(&mut *rng);
        while alpha.is_zero_vartime() {
            alpha = G::Scalar::random(&mut *rng);
        }
        let c = (self.g1 * x_value - self.y1) * alpha;
        (c, alpha)
    }

    /// Samples a precommitment without knowing `x`, for use as a simulated
    /// (non-real) branch of an `OrProof`: any nonzero `C` passes `verify_extra`.
    pub fn simulate_precommitment(&self, rng: &mut (impl RngCore + CryptoRng)) -> G {
        use ff::Field;
        loop {
            let c = G::random(&mut *rng);
            if !bool::from(c.is_identity()) {
                return c;
            }
        }
    }

    /// Builds the instance both parties use once `C` is known (sampled by
    /// the prover, or received by the verifier).
    pub fn instantiate(&self, c: G) -> DLRepNotEqualInstance<G> {
        DLRepNotEqualInstance {
            stmt: self.clone(),
            c,
        }
    }

    /// Whether `x_value` actually witnesses this statement: `Y0 = x·G0` and
    /// `x·G1 ≠ Y1`. Used by composition to auto-detect the real branch of an
    /// `OrProof` from a shared witness map.
    pub fn holds(&self, x_value: G::Scalar) -> bool {
        self.y0 == self.g0 * x_value && self.y1 != self.g1 * x_value
    }

    /// Canonical bytes identifying this statement's public parameters
    /// (`Y0, G0, Y1, G1`), folded into the composite statement identifier.
    pub(crate) fn public_bytes(&self) -> Vec<u8> {
        crate::serialization::serialize_elements(&[self.y0, self.g0, self.y1, self.g1])
    }
}

impl<G: Group + GroupEncoding> DLRepNotEqualInstance<G> {
    pub fn precommitment(&self) -> G {
        self.c
    }

    fn relation(&self) -> LinearRelation<G> {
        let mut relation = LinearRelation::new();
        let [x_var, alpha_var, negbeta_var] = relation.allocate_scalars::<3>();
        let [y1_var, g1a_var, g1b_var, negc_var, y0_var, g0_var] = relation.allocate_elements::<6>();
        relation.set_element(y1_var, self.stmt.y1);
        relation.set_element(g1a_var, self.stmt.g1);
        relation.set_element(g1b_var, self.stmt.g1);
        relation.set_element(negc_var, -self.c);
        relation.set_element(y0_var, self.stmt.y0);
        relation.set_element(g0_var, self.stmt.g0);
        relation.append_equation(negc_var, vec![(alpha_var, y1_var), (negbeta_var, g1b_var)]);
        relation.append_equation(y0_var, vec![(x_var, g0_var)]);
        relation
    }

    fn schnorr(&self) -> SchnorrProof<G> {
        SchnorrProof::from(self.relation())
    }

    /// Position 0 (`x`) is the only bindable slot; `alpha` and `beta` are
    /// local to this atomic.
    pub fn secrets(&self) -> Vec<Option<Secret>> {
        vec![Some(self.stmt.x.clone()), None, None]
    }

    pub fn commitment_len(&self) -> usize {
        self.schnorr().commitment_length()
    }

    /// Recomputes the commitment consistent with a given `(challenge,
    /// response)` pair, without sampling anything.
    pub(crate) fn commitment_from_response(
        &self,
        challenge: &G::Scalar,
        response: &[G::Scalar],
    ) -> Result<Vec<G>, Error> {
        self.schnorr().simulate_commitment(challenge, &response.to_vec())
    }

    pub fn response_len(&self) -> usize {
        self.schnorr().witness_length()
    }

    pub fn commit(
        &self,
        x_value: G::Scalar,
        alpha: G::Scalar,
        given_x_nonce: Option<G::Scalar>,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(Vec<G>, (Vec<G::Scalar>, Vec<G::Scalar>)), Error> {
        let negbeta = -(x_value * alpha);
        let witness = vec![x_value, alpha, negbeta];
        let given_nonces = vec![given_x_nonce, None, None];
        self.schnorr()
            .prover_commit_with_nonces(&witness, &given_nonces, rng)
    }

    pub fn respond(
        &self,
        state: (Vec<G::Scalar>, Vec<G::Scalar>),
        challenge: &G::Scalar,
    ) -> Result<Vec<G::Scalar>, Error> {
        self.schnorr().prover_response(state, challenge)
    }

    /// The algebraic Sigma equations only, no `C != 0` check.
    pub fn verify_equations(
        &self,
        commitment: &[G],
        challenge: &G::Scalar,
        response: &[G::Scalar],
    ) -> Result<(), Error> {
        self.schnorr()
            .verifier(&commitment.to_vec(), challenge, &response.to_vec())
    }

    /// The extra soundness-only condition: `C` must not be the identity.
    pub fn verify_extra(&self) -> Result<(), Error> {
        if bool::from(self.c.is_identity()) {
            Err(Error::VerificationFailure)
        } else {
            Ok(())
        }
    }

    pub fn verify(
        &self,
        commitment: &[G],
        challenge: &G::Scalar,
        response: &[G::Scalar],
    ) -> Result<(), Error> {
        self.verify_extra()?;
        self.verify_equations(commitment, challenge, response)
    }

    pub fn simulate(
        &self,
        challenge: &G::Scalar,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> (Vec<G>, Vec<G::Scalar>) {
        let schnorr = self.schnorr();
        let response = schnorr.simulate_response(rng);
        let commitment = schnorr
            .simulate_commitment(challenge, &response)
            .expect("simulate_response always yields a response of the right length");
        (commitment, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::ristretto::RistrettoPoint as G;
    use ff::Field;
    use group::Group as _;
    use rand::rngs::OsRng;

    #[test]
    fn completeness_for_distinct_discrete_logs() {
        let mut rng = OsRng;
        let g0 = G::generator();
        let g1 = G::generator() * <G as Group>::Scalar::from(5u64);

        let x0 = <G as Group>::Scalar::from(11u64);
        let x1 = <G as Group>::Scalar::from(12u64);
        let y0 = g0 * x0;
        let y1 = g1 * x1;

        let stmt = DLRepNotEqual::new(y0, g0, y1, g1, Secret::named("x"), false);
        let (c, alpha) = stmt.precommit(x0, &mut rng);
        let instance = stmt.instantiate(c);

        let (commitment, state) = instance.commit(x0, alpha, None, &mut rng).unwrap();
        let challenge = <G as Group>::Scalar::random(&mut rng);
        let response = instance.respond(state, &challenge).unwrap();
        assert!(instance.verify(&commitment, &challenge, &response).is_ok());
    }

    #[test]
    fn equal_discrete_logs_cannot_produce_nonzero_precommitment() {
        let mut rng = OsRng;
        let g0 = G::generator();
        let g1 = G::generator() * <G as Group>::Scalar::from(5u64);
        let x = <G as Group>::Scalar::from(9u64);
        let y0 = g0 * x;
        let y1 = g1 * x; // same discrete log as x0

        let stmt = DLRepNotEqual::new(y0, g0, y1, g1, Secret::named("x"), false);
        let (c, _alpha) = stmt.precommit(x, &mut rng);
        assert!(bool::from(c.is_identity()));
        let instance = stmt.instantiate(c);
        assert!(instance.verify_extra().is_err());
    }
}
