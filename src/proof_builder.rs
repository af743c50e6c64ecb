//! # Proof Builder for single-equation Sigma Protocols
//!
//! [`ProofBuilder`] is a high-level convenience wrapper around a single
//! [`LinearRelation`]/[`SchnorrProof`], Fiat-Shamir transformed via
//! [`NISigmaProtocol`]. It is the ambient "quick Schnorr/Pedersen/DLEQ
//! proof" entry point; statements that need conjunction, disjunction, or
//! the DLRep-not-equal/BBS+ atomics go through [`crate::composition`]
//! instead.
//!
//! ## Features
//! - Allocates scalar and point variables for constructing group equations.
//! - Appends equations representing statements to be proven.
//! - Supports element assignment to statement variables.
//! - Offers one-shot `prove` and `verify` methods.

use group::{Group, GroupEncoding};
use rand::{CryptoRng, RngCore};

use crate::codec::ShakeCodec;
use crate::errors::Error;
use crate::fiat_shamir::NISigmaProtocol;
use crate::linear_relation::{GroupVar, LinearRelation, ScalarVar};
use crate::schnorr_protocol::SchnorrProof;

/// A builder that helps construct Sigma proofs for linear group relations.
///
/// This struct wraps a [`SchnorrProof`] over a [`LinearRelation`] and applies
/// the Fiat-Shamir transform via [`NISigmaProtocol`]. It provides a
/// user-friendly API for allocating variables, defining statements, and
/// generating proofs.
pub struct ProofBuilder<G>
where
    G: Group + GroupEncoding,
{
    relation: LinearRelation<G>,
    domain_sep: Vec<u8>,
}

impl<G> ProofBuilder<G>
where
    G: Group + GroupEncoding,
{
    /// Creates a new, empty proof builder using the given domain separator.
    pub fn new(domain_sep: &[u8]) -> Self {
        Self {
            relation: LinearRelation::new(),
            domain_sep: domain_sep.to_vec(),
        }
    }

    /// Adds a new equation to the proof statement of the form:
    /// `lhs = Σ (scalar_i * point_i)`.
    pub fn append_equation(&mut self, lhs: GroupVar, rhs: &[(ScalarVar, GroupVar)]) {
        self.relation.append_equation(lhs, rhs.to_vec());
    }

    /// Allocates `n` scalar variables for use in the proof.
    pub fn allocate_scalars(&mut self, n: usize) -> Vec<ScalarVar> {
        (0..n).map(|_| self.relation.allocate_scalar()).collect()
    }

    /// Allocates `n` point variables (group elements) for use in the proof.
    pub fn allocate_elements(&mut self, n: usize) -> Vec<GroupVar> {
        (0..n).map(|_| self.relation.allocate_element()).collect()
    }

    /// Assigns specific group elements to point variables (indices).
    pub fn set_elements(&mut self, elements: &[(GroupVar, G)]) {
        self.relation.set_elements(elements.iter().copied());
    }

    /// Returns the expected group element results (`lhs`) of the current equations.
    pub fn image(&self) -> Result<Vec<G>, Error> {
        self.relation.image()
    }

    fn protocol(&self) -> NISigmaProtocol<SchnorrProof<G>, ShakeCodec<G>> {
        let schnorr = SchnorrProof::from(self.relation.clone());
        NISigmaProtocol::new(&self.domain_sep, schnorr)
    }

    /// Generates a non-interactive zero-knowledge proof for the current
    /// statement using the given witness, in batchable
    /// (`commitment || response`) format.
    pub fn prove(
        &self,
        witness: &[<G as Group>::Scalar],
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Vec<u8>, Error> {
        self.protocol().prove_batchable(&witness.to_vec(), rng)
    }

    /// Verifies a serialized batchable proof against the current statement.
    pub fn verify(&self, proof: &[u8]) -> Result<(), Error> {
        self.protocol().verify_batchable(proof)
    }

    /// Generates a compact (`challenge || response`) proof for the current
    /// statement using the given witness.
    pub fn prove_compact(
        &self,
        witness: &[<G as Group>::Scalar],
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Vec<u8>, Error> {
        self.protocol().prove_compact(&witness.to_vec(), rng)
    }

    /// Verifies a serialized compact proof against the current statement.
    pub fn verify_compact(&self, proof: &[u8]) -> Result<(), Error> {
        self.protocol().verify_compact(proof)
    }
}
