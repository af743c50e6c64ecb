//! Fiat-Shamir transformation for a single [`SigmaProtocol`] instance.
//!
//! [`NISigmaProtocol`] wraps any three-move Sigma protocol and a transcript
//! [`Codec`] to produce non-interactive proofs: the verifier's random
//! challenge is replaced by a hash of the protocol's public instance data
//! and the prover's commitment.
//!
//! This is the low-level, single-statement convenience surface (mirrored by
//! [`crate::proof_builder::ProofBuilder`]). The composed-statement engine
//! (`AndProof`/`OrProof`/`Prover`/`Verifier`) has its own Fiat-Shamir
//! wiring in [`crate::composition`], since a composite's statement
//! identifier must hash the whole tree, not just one instance label.

use rand::{CryptoRng, RngCore};

use crate::codec::Codec;
use crate::errors::Error;
use crate::traits::SigmaProtocol;

type Transcript<P> = (
    <P as SigmaProtocol>::Commitment,
    <P as SigmaProtocol>::Challenge,
    <P as SigmaProtocol>::Response,
);

/// A Fiat-Shamir-transformed Sigma protocol.
pub struct NISigmaProtocol<P, C>
where
    P: SigmaProtocol,
    C: Codec<Challenge = P::Challenge> + Clone,
{
    hash_state: C,
    pub sigmap: P,
}

impl<P, C> NISigmaProtocol<P, C>
where
    P: SigmaProtocol,
    C: Codec<Challenge = P::Challenge> + Clone,
{
    /// Creates a new non-interactive wrapper, binding the codec to a domain
    /// separator and to the instance's own public parameters.
    pub fn new(iv: &[u8], instance: P) -> Self {
        let mut hash_state = C::new(iv);
        hash_state.prover_message(instance.protocol_identifier().as_ref());
        hash_state.prover_message(instance.instance_label().as_ref());
        Self {
            hash_state,
            sigmap: instance,
        }
    }

    /// Produces a non-interactive `(commitment, challenge, response)` transcript.
    pub fn prove(
        &self,
        witness: &P::Witness,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Transcript<P>, Error> {
        let mut codec = self.hash_state.clone();
        let (commitment, prover_state) = self.sigmap.prover_commit(witness, rng)?;
        codec.prover_message(&self.sigmap.serialize_commitment(&commitment));
        let challenge = codec.verifier_challenge();
        let response = self.sigmap.prover_response(prover_state, &challenge)?;
        Ok((commitment, challenge, response))
    }

    /// Verifies a non-interactive transcript: rehashes the commitment,
    /// checks it against the supplied challenge, then checks the
    /// protocol's own verification equation.
    pub fn verify(
        &self,
        commitment: &P::Commitment,
        challenge: &P::Challenge,
        response: &P::Response,
    ) -> Result<(), Error>
    where
        P::Challenge: PartialEq,
    {
        let mut codec = self.hash_state.clone();
        codec.prover_message(&self.sigmap.serialize_commitment(commitment));
        let expected_challenge = codec.verifier_challenge();
        if *challenge != expected_challenge {
            return Err(Error::VerificationFailure);
        }
        self.sigmap.verifier(commitment, challenge, response)
    }

    /// Proves and serializes the commitment and response into a single
    /// "batchable" byte string (the challenge is recomputed on verify, not
    /// carried).
    pub fn prove_batchable(
        &self,
        witness: &P::Witness,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Vec<u8>, Error> {
        let (commitment, _challenge, response) = self.prove(witness, rng)?;
        let mut bytes = self.sigmap.serialize_commitment(&commitment);
        bytes.extend(self.sigmap.serialize_response(&response));
        Ok(bytes)
    }

    /// Verifies a batchable proof produced by [`Self::prove_batchable`].
    pub fn verify_batchable(&self, proof: &[u8]) -> Result<(), Error>
    where
        P::Challenge: PartialEq,
    {
        let commit_len = self.sigmap.commitment_byte_len();
        if proof.len() < commit_len {
            return Err(Error::InvalidInstanceWitnessPair);
        }
        let (commit_bytes, response_bytes) = proof.split_at(commit_len);
        let commitment = self.sigmap.deserialize_commitment(commit_bytes)?;
        let response = self.sigmap.deserialize_response(response_bytes)?;

        let mut codec = self.hash_state.clone();
        codec.prover_message(&self.sigmap.serialize_commitment(&commitment));
        let challenge = codec.verifier_challenge();
        self.sigmap.verifier(&commitment, &challenge, &response)
    }

    /// Proves and serializes as a "compact" byte string (`challenge || response`):
    /// the verifier recomputes the commitment from the verification equation.
    pub fn prove_compact(
        &self,
        witness: &P::Witness,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Vec<u8>, Error> {
        let (_commitment, challenge, response) = self.prove(witness, rng)?;
        let mut bytes = self.sigmap.serialize_challenge(&challenge);
        bytes.extend(self.sigmap.serialize_response(&response));
        Ok(bytes)
    }
}

/// Extension for protocols that can recompute their commitment from a
/// `(challenge, response)` pair, enabling the compact proof encoding.
pub trait CompactProtocol: SigmaProtocol {
    fn get_commitment(
        &self,
        challenge: &Self::Challenge,
        response: &Self::Response,
    ) -> Result<Self::Commitment, Error>;
}

impl<P, C> NISigmaProtocol<P, C>
where
    P: SigmaProtocol + CompactProtocol,
    C: Codec<Challenge = P::Challenge> + Clone,
    P::Challenge: PartialEq,
{
    /// Verifies a compact proof produced by [`Self::prove_compact`].
    pub fn verify_compact(&self, proof: &[u8]) -> Result<(), Error> {
        let challenge_len = proof.len() - self.sigmap.response_byte_len();
        let (challenge_bytes, response_bytes) = proof.split_at(challenge_len);
        let challenge = self.sigmap.deserialize_challenge(challenge_bytes)?;
        let response = self.sigmap.deserialize_response(response_bytes)?;
        let commitment = self.sigmap.get_commitment(&challenge, &response)?;
        self.verify(&commitment, &challenge, &response)
    }
}
