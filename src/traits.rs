//! Object-agnostic Sigma protocol contracts.
//!
//! These traits capture the three-move commit/challenge/response shape
//! (Sigma protocol proper) plus the simulator extension used by `OrProof`
//! branches and zero-knowledge testing. Every atomic statement (`DLRep`,
//! `DLRepNotEqual`, `SignatureProof`) and every composite (`AndProof`,
//! `OrProof`) implements [`SigmaProtocol`]; atomics additionally implement
//! [`SigmaProtocolSimulator`].

use rand::{CryptoRng, Rng, RngCore};

use crate::errors::Error;

/// The three-move commit/challenge/response contract of a Sigma protocol.
pub trait SigmaProtocol {
    /// The prover's first message.
    type Commitment;
    /// State the prover carries between `prover_commit` and `prover_response`.
    type ProverState;
    /// The prover's second message.
    type Response;
    /// The witness the prover holds.
    type Witness;
    /// The verifier's (or Fiat-Shamir-derived) challenge.
    type Challenge;

    /// Samples randomness and produces a commitment for the given witness.
    fn prover_commit(
        &self,
        witness: &Self::Witness,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(Self::Commitment, Self::ProverState), Error>;

    /// Computes the response for a previously issued challenge.
    fn prover_response(
        &self,
        prover_state: Self::ProverState,
        challenge: &Self::Challenge,
    ) -> Result<Self::Response, Error>;

    /// Checks the verification equation for a `(commitment, challenge, response)` triple.
    fn verifier(
        &self,
        commitment: &Self::Commitment,
        challenge: &Self::Challenge,
        response: &Self::Response,
    ) -> Result<(), Error>;

    fn serialize_commitment(&self, commitment: &Self::Commitment) -> Vec<u8>;
    fn serialize_challenge(&self, challenge: &Self::Challenge) -> Vec<u8>;
    fn serialize_response(&self, response: &Self::Response) -> Vec<u8>;

    fn deserialize_commitment(&self, data: &[u8]) -> Result<Self::Commitment, Error>;
    fn deserialize_challenge(&self, data: &[u8]) -> Result<Self::Challenge, Error>;
    fn deserialize_response(&self, data: &[u8]) -> Result<Self::Response, Error>;

    /// Byte length of a serialized commitment, used to split a batchable
    /// proof (`commitment || response`) without ambiguity.
    fn commitment_byte_len(&self) -> usize;
    /// Byte length of a serialized response.
    fn response_byte_len(&self) -> usize;

    /// A label describing the *instance* (public parameters) of this statement,
    /// folded into the Fiat-Shamir statement identifier.
    fn instance_label(&self) -> impl AsRef<[u8]>;

    /// A fixed label identifying the protocol family (used for domain separation).
    fn protocol_identifier(&self) -> impl AsRef<[u8]>;
}

/// Extension for atomic Sigma protocols that support simulation: producing a
/// transcript that verifies without knowledge of a witness. Used inside
/// `OrProof` branches that are not the prover's real branch, and to test
/// zero-knowledge (a simulated transcript must verify via the protocol's own
/// equation, but must not verify as a *Fiat-Shamir* transcript since the
/// challenge was not derived from the commitment).
pub trait SigmaProtocolSimulator: SigmaProtocol {
    /// Samples a uniformly random response, independent of any witness.
    fn simulate_response<R: Rng + CryptoRng>(&self, rng: &mut R) -> Self::Response;

    /// Samples a full `(commitment, challenge, response)` transcript that
    /// satisfies the verification equation.
    fn simulate_transcript<R: Rng + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(Self::Commitment, Self::Challenge, Self::Response), Error>;

    /// Recomputes the unique commitment consistent with a given
    /// `(challenge, response)` pair.
    fn simulate_commitment(
        &self,
        challenge: &Self::Challenge,
        response: &Self::Response,
    ) -> Result<Self::Commitment, Error>;
}
