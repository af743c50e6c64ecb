//! `DLRep`: knowledge of a discrete-log representation `Y = Σ xᵢ·Gᵢ`.
//!
//! This is the base atomic statement of the whole framework: every other
//! atomic (`DLRepNotEqual`, `SignatureProof`) reduces, internally, to one or
//! two `DLRep`-shaped linear equations driven by the same
//! [`SchnorrProof`]/[`LinearRelation`] machinery.

use std::collections::HashMap;

use group::{Group, GroupEncoding};
use rand::{CryptoRng, RngCore};

use crate::errors::Error;
use crate::expression::Expression;
use crate::linear_relation::LinearRelation;
use crate::schnorr_protocol::SchnorrProof;
use crate::secret::Secret;
use crate::traits::{SigmaProtocol, SigmaProtocolSimulator};

/// `lhs = Σ sᵢ·Gᵢ`, knowledge of `{sᵢ}`.
#[derive(Clone, Debug)]
pub struct DLRep<G: Group + GroupEncoding> {
    lhs: G,
    schnorr: SchnorrProof<G>,
    /// One entry per distinct scalar variable, in allocation order; this is
    /// also the order of the witness/response vectors.
    secrets: Vec<Secret>,
    /// One entry per term of the defining expression, in term order
    /// (duplicates kept if a generator is reused across terms): the `Gᵢ` in
    /// `lhs = Σ sᵢ·Gᵢ`, folded into the Fiat-Shamir statement identifier
    /// alongside `lhs` itself.
    generators: Vec<G>,
}

impl<G: Group + GroupEncoding> DLRep<G> {
    /// Builds the statement `lhs = Σ sᵢ·Gᵢ` from a [`Expression`]. A
    /// `Secret` that occurs in more than one term of the expression is
    /// allocated a single scalar variable (one witness value, reused).
    pub fn new(lhs: G, expression: Expression<G>) -> Result<Self, Error> {
        if expression.terms().is_empty() {
            return Err(Error::InvalidStatement(
                "DLRep expression has no terms".into(),
            ));
        }

        let mut relation = LinearRelation::new();
        let mut secrets = Vec::new();
        let mut generators = Vec::new();
        let mut scalar_of: HashMap<Secret, crate::linear_relation::ScalarVar> = HashMap::new();
        let mut terms = Vec::new();

        for (secret, point) in expression.terms() {
            let scalar_var = *scalar_of.entry(secret.clone()).or_insert_with(|| {
                secrets.push(secret.clone());
                relation.allocate_scalar()
            });
            let point_var = relation.allocate_element();
            relation.set_element(point_var, *point);
            terms.push((scalar_var, point_var));
            generators.push(*point);
        }

        let lhs_var = relation.allocate_element();
        relation.set_element(lhs_var, lhs);
        relation.append_equation(lhs_var, terms);

        Ok(Self {
            lhs,
            schnorr: SchnorrProof::from(relation),
            secrets,
            generators,
        })
    }

    pub fn lhs(&self) -> G {
        self.lhs
    }

    /// The distinct secrets referenced, in witness/response order.
    pub fn secrets(&self) -> &[Secret] {
        &self.secrets
    }

    /// The `Gᵢ` generators of `lhs = Σ sᵢ·Gᵢ`, in term order, for folding
    /// into the Fiat-Shamir statement identifier.
    pub(crate) fn generators(&self) -> &[G] {
        &self.generators
    }

    pub fn commitment_len(&self) -> usize {
        self.schnorr.commitment_length()
    }

    /// Canonical bytes identifying this atomic's public parameters, folded
    /// into the composite statement identifier.
    pub(crate) fn label(&self) -> Vec<u8> {
        self.schnorr.0.label()
    }

    /// Recomputes the commitment consistent with a given `(challenge,
    /// response)` pair, without sampling anything. Used both to verify a
    /// compact/Fiat-Shamir proof and to simulate a branch while keeping a
    /// bound secret's response value fixed.
    pub(crate) fn commitment_from_response(
        &self,
        challenge: &G::Scalar,
        response: &[G::Scalar],
    ) -> Result<Vec<G>, Error> {
        self.schnorr.simulate_commitment(challenge, &response.to_vec())
    }

    pub fn response_len(&self) -> usize {
        self.schnorr.witness_length()
    }

    /// Samples a commitment, reusing `given_nonces[i]` where present
    /// (used by `AndProof` to force shared randomness for bound secrets).
    pub fn commit(
        &self,
        witness: &[G::Scalar],
        given_nonces: &[Option<G::Scalar>],
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(Vec<G>, (Vec<G::Scalar>, Vec<G::Scalar>)), Error> {
        self.schnorr
            .prover_commit_with_nonces(&witness.to_vec(), given_nonces, rng)
    }

    pub fn respond(
        &self,
        state: (Vec<G::Scalar>, Vec<G::Scalar>),
        challenge: &G::Scalar,
    ) -> Result<Vec<G::Scalar>, Error> {
        self.schnorr.prover_response(state, challenge)
    }

    /// DLRep has no soundness-only checks beyond its Schnorr equation, so
    /// `verify` and `verify_equations` coincide.
    pub fn verify(
        &self,
        commitment: &[G],
        challenge: &G::Scalar,
        response: &[G::Scalar],
    ) -> Result<(), Error> {
        self.schnorr
            .verifier(&commitment.to_vec(), challenge, &response.to_vec())
    }

    pub fn simulate(
        &self,
        challenge: &G::Scalar,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> (Vec<G>, Vec<G::Scalar>) {
        let response = self.schnorr.simulate_response(rng);
        let commitment = self
            .schnorr
            .simulate_commitment(challenge, &response)
            .expect("simulate_response always yields a response of the right length");
        (commitment, response)
    }

    /// Whether `witness` (aligned with [`Self::secrets`]) actually satisfies
    /// `lhs = Σ sᵢ·Gᵢ`. Used by composition to auto-detect the real branch
    /// of an `OrProof` from a shared witness map.
    pub fn holds(&self, witness: &[G::Scalar]) -> bool {
        match self.schnorr.0.linear_map.evaluate(witness) {
            Ok(image) => image == vec![self.lhs],
            Err(_) => false,
        }
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
    fn completeness_and_soundness() {
        let mut rng = OsRng;
        let g = G::generator();
        let x = Secret::named("x");

        let witness = <G as Group>::Scalar::from(3u64);
        let y = g * witness;

        let dlrep = DLRep::new(y, x.clone() * g).unwrap();
        let (commitment, state) = dlrep.commit(&[witness], &[None], &mut rng).unwrap();
        let challenge = <G as Group>::Scalar::random(&mut rng);
        let response = dlrep.respond(state, &challenge).unwrap();
        assert!(dlrep.verify(&commitment, &challenge, &response).is_ok());

        let wrong_witness = <G as Group>::Scalar::from(4u64);
        let (commitment2, state2) = dlrep.commit(&[wrong_witness], &[None], &mut rng).unwrap();
        let response2 = dlrep.respond(state2, &challenge).unwrap();
        assert!(dlrep.verify(&commitment2, &challenge, &response2).is_err());
    }

    #[test]
    fn empty_expression_is_rejected() {
        let expr: Expression<G> = Expression::new();
        assert!(DLRep::new(G::identity(), expr).is_err());
    }

    #[test]
    fn simulation_verifies_but_not_twice_consistently() {
        let mut rng = OsRng;
        let g = G::generator();
        let x = Secret::named("x");
        let y = g * <G as Group>::Scalar::from(7u64);
        let dlrep = DLRep::new(y, x * g).unwrap();

        let challenge = <G as Group>::Scalar::random(&mut rng);
        let (commitment, response) = dlrep.simulate(&challenge, &mut rng);
        assert!(dlrep.verify(&commitment, &challenge, &response).is_ok());
    }
}
