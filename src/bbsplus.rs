//! BBS+ signatures and the `SignatureProof` atomic: knowledge of a valid
//! signature over a vector of (partially hidden) messages, over
//! `bls12_381`.
//!
//! Unlike `DLRep`/`DLRepNotEqual`, this module is not generic over the
//! group: BBS+ needs a bilinear pairing, so it is fixed to
//! `bls12_381::{G1Projective, G2Projective, Gt}`. It still composes with
//! generic `Statement<G>` trees for any `G` through the
//! `Statement::Signature` variant, since the variant's payload type only
//! needs to be well-formed, not generically useful, for a given `G`.
//!
//! Construction, following the randomize-then-prove-knowledge pattern
//! (Au–Susilo–Mu): signing computes `A = (h0 + Σ hᵢ·mᵢ + g1·s)·(e + sk)⁻¹`;
//! a proof randomizes `(A, e, s)` into `(A', Ābar, d)` with fresh `r1, r2`,
//! then proves knowledge of `e, s, {mᵢ}` (plus the internal blinding
//! scalars `r2, r3 = r1⁻¹, t = r3·r2`) satisfying two linear equations, so
//! that `e` and `s` never appear bare to the verifier. Verification
//! additionally checks `A' ≠ 0` and `e(A', pk) = e(Ābar, g2)`.

use bls12_381::{pairing, G1Projective, G2Projective, Scalar};
use ff::Field;
use group::{Curve, Group};
use rand::{CryptoRng, RngCore};

use crate::errors::Error;
use crate::linear_relation::LinearRelation;
use crate::schnorr_protocol::SchnorrProof;
use crate::secret::Secret;
use crate::traits::{SigmaProtocol, SigmaProtocolSimulator};

/// The issuer's keypair: secret key plus the public generators messages are
/// committed against.
#[derive(Clone, Debug)]
pub struct Keypair {
    sk: Scalar,
    pk: PublicKey,
}

impl Keypair {
    /// Generates a fresh keypair supporting signatures over `message_count`
    /// messages.
    pub fn new(message_count: usize, rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let sk = Scalar::random(&mut *rng);
        let g1 = G1Projective::generator();
        let g2 = G2Projective::generator();
        let pk = g2 * sk;
        let h0 = G1Projective::random(&mut *rng);
        let generators = (0..message_count)
            .map(|_| G1Projective::random(&mut *rng))
            .collect();
        Self {
            sk,
            pk: PublicKey {
                pk,
                g1,
                g2,
                h0,
                generators,
            },
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Signer's half of blind issuance: given the requester's commitment to
    /// their (hidden) messages, issues a presignature binding a fresh `e`
    /// and the signer's own blinding share `s2`.
    pub fn sign(
        &self,
        commitment_message: G1Projective,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Presignature {
        let e = Scalar::random(&mut *rng);
        let s2 = Scalar::random(&mut *rng);
        let b = commitment_message + self.pk.g1 * s2;
        let inv = Option::<Scalar>::from((e + self.sk).invert())
            .expect("e + sk is nonzero with overwhelming probability");
        let a = b * inv;
        Presignature { a, e, s2 }
    }
}

/// The public parameters a `SignatureProof`/verifier needs: the issuer's
/// public key and the generators messages are committed against (`h0` for
/// the blinding term, `generators[i]` for message `i`).
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub pk: G2Projective,
    pub g1: G1Projective,
    pub g2: G2Projective,
    pub h0: G1Projective,
    pub generators: Vec<G1Projective>,
}

impl PublicKey {
    fn commitment(&self, messages: &[Scalar], s: Scalar) -> G1Projective {
        let mut acc = self.h0 + self.g1 * s;
        for (h, m) in self.generators.iter().zip(messages) {
            acc += *h * m;
        }
        acc
    }
}

/// The requester's half of blind issuance.
pub struct SignatureCreator<'a> {
    pk: &'a PublicKey,
    messages: Vec<Scalar>,
    s1: Scalar,
}

/// The Pedersen commitment to the requester's (still hidden) messages,
/// sent to the signer.
pub struct Commitment {
    pub commitment_message: G1Projective,
}

/// The signer's response: everything the requester needs to assemble a
/// full `Signature`, without the signer ever learning the messages.
pub struct Presignature {
    a: G1Projective,
    e: Scalar,
    s2: Scalar,
}

impl<'a> SignatureCreator<'a> {
    /// Commits to `messages` under a fresh blinding share `s1`.
    pub fn commit(
        pk: &'a PublicKey,
        messages: Vec<Scalar>,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> (Self, Commitment) {
        let s1 = Scalar::random(&mut *rng);
        let commitment_message = pk.commitment(&messages, s1);
        (
            Self { pk, messages, s1 },
            Commitment { commitment_message },
        )
    }

    /// Combines a signer's `Presignature` with this requester's own
    /// blinding share into the final, usable `Signature`.
    pub fn obtain_signature(&self, presignature: Presignature) -> Signature {
        Signature {
            a: presignature.a,
            e: presignature.e,
            s: self.s1 + presignature.s2,
        }
    }

    pub fn messages(&self) -> &[Scalar] {
        &self.messages
    }
}

/// A BBS+ signature `(A, e, s)` over a vector of messages.
#[derive(Clone, Copy, Debug)]
pub struct Signature {
    pub a: G1Projective,
    pub e: Scalar,
    pub s: Scalar,
}

impl Signature {
    /// Direct (non-blind) verification against the plaintext messages;
    /// convenience for tests and for issuers checking their own output.
    pub fn verify(&self, pk: &PublicKey, messages: &[Scalar]) -> bool {
        let b = pk.commitment(messages, self.s);
        let lhs = pairing(
            &self.a.to_affine(),
            &(pk.pk + pk.g2 * self.e).to_affine(),
        );
        let rhs = pairing(&b.to_affine(), &pk.g2.to_affine());
        lhs == rhs
    }
}

/// The statement "I know a signature over messages `m_1..m_k`, with secrets
/// `[e, s, m_1, .., m_k]`". Carries the signature itself only on the
/// prover's copy; the verifier's copy has `signature = None`.
#[derive(Clone, Debug)]
pub struct SignatureProof {
    pk: PublicKey,
    secrets: Vec<Secret>,
    signature: Option<Signature>,
}

/// The public, randomized commitments `(A', Ābar, d)` sent as a
/// precommitment, from which both parties build the same internal relation.
#[derive(Clone, Copy, Debug)]
pub struct SignaturePrecommit {
    pub a_prime: G1Projective,
    pub a_bar: G1Projective,
    pub d: G1Projective,
}

/// Prover-only auxiliary randomness produced alongside a precommitment,
/// needed again at commit time.
#[derive(Clone, Copy, Debug)]
pub struct SignatureProofAux {
    r2: Scalar,
    r3: Scalar,
    t: Scalar,
}

/// A `SignatureProof` instantiated with a concrete precommitment: the
/// object both prover and verifier actually run the Sigma protocol against.
#[derive(Clone, Debug)]
pub struct SignatureProofInstance {
    stmt: SignatureProof,
    precommit: SignaturePrecommit,
}

impl SignatureProof {
    /// `secrets` must list `[e, s, m_1, .., m_k]` where `k = pk.generators.len()`.
    pub fn new(secrets: Vec<Secret>, pk: PublicKey) -> Result<Self, Error> {
        if secrets.len() != 2 + pk.generators.len() {
            return Err(Error::InvalidStatement(
                "SignatureProof needs secrets [e, s, m_1..m_k] matching the key's message count"
                    .into(),
            ));
        }
        Ok(Self {
            pk,
            secrets,
            signature: None,
        })
    }

    /// Attaches the actual signature, turning a verifier-shaped statement
    /// into one a prover can precommit and commit with.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn secrets_named(&self) -> &[Secret] {
        &self.secrets
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Canonical bytes identifying this statement's public parameters (the
    /// issuer's key and the message count), folded into the composite
    /// statement identifier.
    pub(crate) fn public_bytes(&self) -> Vec<u8> {
        let mut out = crate::serialization::serialize_elements(&[self.pk.pk]);
        out.extend(crate::serialization::serialize_elements(&[
            self.pk.g1, self.pk.g2, self.pk.h0,
        ]));
        out.extend(crate::serialization::serialize_elements(&self.pk.generators));
        out.extend((self.secrets.len() as u32).to_le_bytes());
        out
    }

    /// Whether `witness` (`[e, s, m_1..m_k]`) is an actual signature this
    /// statement can be proven with. Used by composition to auto-detect the
    /// real branch of an `OrProof` from a shared witness map; a `SignatureProof`
    /// can never be the *simulated* branch of a disjunction (forging a BBS+
    /// pairing check without the issuer's secret key is precisely what the
    /// scheme's unforgeability rules out), so every branch of this kind
    /// composed into an `OrProof` must satisfy this.
    pub fn is_provable(&self, witness: &[Scalar]) -> bool {
        let Some(signature) = self.signature.as_ref() else {
            return false;
        };
        if witness.len() != self.secrets.len() || witness[0] != signature.e || witness[1] != signature.s {
            return false;
        }
        signature.verify(&self.pk, &witness[2..])
    }

    /// Samples `(r1, r2)`, randomizes the signature into `(A', Ābar, d)`,
    /// and derives the auxiliary scalars needed for `commit`.
    ///
    /// `witness` is `[e, s, m_1, .., m_k]`, matching `secrets_named()`.
    pub fn precommit(
        &self,
        witness: &[Scalar],
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(SignaturePrecommit, SignatureProofAux), Error> {
        let signature = self
            .signature
            .as_ref()
            .ok_or_else(|| Error::MissingWitness("signature".into()))?;
        if witness.len() != self.secrets.len() {
            return Err(Error::InvalidInstanceWitnessPair);
        }
        let e = witness[0];
        let s = witness[1];
        let messages = &witness[2..];
        let b = self.pk.commitment(messages, s);

        let mut r1 = Scalar::random(&mut *rng);
        while bool::from(r1.is_zero()) {
            r1 = Scalar::random(&mut *rng);
        }
        let r2 = Scalar::random(&mut *rng);

        let a_prime = signature.a * r1;
        let a_bar = a_prime * (-e) + b * r1;
        let d = b * r1 - self.pk.g1 * r2;
        let r3 = Option::<Scalar>::from(r1.invert()).expect("r1 sampled nonzero above");
        let t = r3 * r2;

        Ok((SignaturePrecommit { a_prime, a_bar, d }, SignatureProofAux { r2, r3, t }))
    }

    /// Builds the instance both parties run the Sigma protocol against,
    /// from a (received or just-produced) precommitment.
    pub fn instantiate(&self, precommit: SignaturePrecommit) -> SignatureProofInstance {
        SignatureProofInstance {
            stmt: self.clone(),
            precommit,
        }
    }
}

impl SignatureProofInstance {
    pub fn precommitment(&self) -> SignaturePrecommit {
        self.precommit
    }

    fn message_count(&self) -> usize {
        self.stmt.pk.generators.len()
    }

    /// Internal scalar order: `[e, r2, r3, m_1..m_k, s, t]`.
    fn relation(&self) -> LinearRelation<G1Projective> {
        let k = self.message_count();
        let mut relation = LinearRelation::new();
        let e_var = relation.allocate_scalar();
        let r2_var = relation.allocate_scalar();
        let r3_var = relation.allocate_scalar();
        let m_vars: Vec<_> = (0..k).map(|_| relation.allocate_scalar()).collect();
        let s_var = relation.allocate_scalar();
        let t_var = relation.allocate_scalar();

        let neg_a_prime_var = relation.allocate_element();
        relation.set_element(neg_a_prime_var, -self.precommit.a_prime);
        let g1_var = relation.allocate_element();
        relation.set_element(g1_var, self.stmt.pk.g1);
        let abar_minus_d_var = relation.allocate_element();
        relation.set_element(abar_minus_d_var, self.precommit.a_bar - self.precommit.d);
        relation.append_equation(
            abar_minus_d_var,
            vec![(e_var, neg_a_prime_var), (r2_var, g1_var)],
        );

        let d_var = relation.allocate_element();
        relation.set_element(d_var, self.precommit.d);
        let neg_h_vars: Vec<_> = self
            .stmt
            .pk
            .generators
            .iter()
            .map(|h| {
                let v = relation.allocate_element();
                relation.set_element(v, -*h);
                v
            })
            .collect();
        let neg_g1_var = relation.allocate_element();
        relation.set_element(neg_g1_var, -self.stmt.pk.g1);
        let g1_var2 = relation.allocate_element();
        relation.set_element(g1_var2, self.stmt.pk.g1);
        let h0_var = relation.allocate_element();
        relation.set_element(h0_var, self.stmt.pk.h0);

        let mut terms2 = vec![(r3_var, d_var)];
        for (m_var, neg_h_var) in m_vars.iter().zip(neg_h_vars.iter()) {
            terms2.push((*m_var, *neg_h_var));
        }
        terms2.push((s_var, neg_g1_var));
        terms2.push((t_var, g1_var2));
        relation.append_equation(h0_var, terms2);

        relation
    }

    fn schnorr(&self) -> SchnorrProof<G1Projective> {
        SchnorrProof::from(self.relation())
    }

    /// One entry per internal scalar slot (`e, r2, r3, m_1..m_k, s, t`);
    /// only `e`, the `m_i`, and `s` are bindable, named slots.
    pub fn secrets(&self) -> Vec<Option<Secret>> {
        let k = self.message_count();
        let mut out = vec![Some(self.stmt.secrets[0].clone()), None, None];
        for i in 0..k {
            out.push(Some(self.stmt.secrets[2 + i].clone()));
        }
        out.push(Some(self.stmt.secrets[1].clone()));
        out.push(None);
        out
    }

    pub fn commitment_len(&self) -> usize {
        self.schnorr().commitment_length()
    }

    pub fn response_len(&self) -> usize {
        self.schnorr().witness_length()
    }

    /// Recomputes the commitment consistent with a given `(challenge,
    /// response)` pair, without sampling anything.
    pub(crate) fn commitment_from_response(
        &self,
        challenge: &Scalar,
        response: &[Scalar],
    ) -> Result<Vec<G1Projective>, Error> {
        self.schnorr().simulate_commitment(challenge, &response.to_vec())
    }

    /// `witness` is `[e, s, m_1..m_k]`, matching `SignatureProof::secrets_named`.
    /// `given_nonces` is aligned to `secrets()` (internal order).
    pub fn commit(
        &self,
        witness: &[Scalar],
        aux: &SignatureProofAux,
        given_nonces: &[Option<Scalar>],
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(Vec<G1Projective>, (Vec<Scalar>, Vec<Scalar>)), Error> {
        let k = self.message_count();
        if witness.len() != 2 + k {
            return Err(Error::InvalidInstanceWitnessPair);
        }
        let e = witness[0];
        let s = witness[1];
        let messages = &witness[2..];

        let mut internal_witness = vec![e, aux.r2, aux.r3];
        internal_witness.extend_from_slice(messages);
        internal_witness.push(s);
        internal_witness.push(aux.t);

        self.schnorr()
            .prover_commit_with_nonces(&internal_witness, given_nonces, rng)
    }

    pub fn respond(
        &self,
        state: (Vec<Scalar>, Vec<Scalar>),
        challenge: &Scalar,
    ) -> Result<Vec<Scalar>, Error> {
        self.schnorr().prover_response(state, challenge)
    }

    /// The algebraic Sigma equations only, no `A' != 0` or pairing check.
    pub fn verify_equations(
        &self,
        commitment: &[G1Projective],
        challenge: &Scalar,
        response: &[Scalar],
    ) -> Result<(), Error> {
        self.schnorr()
            .verifier(&commitment.to_vec(), challenge, &response.to_vec())
    }

    /// The extra soundness-only conditions: `A' != 0` and the pairing check
    /// tying `(A', Ābar)` to the issuer's public key.
    pub fn verify_extra(&self) -> Result<(), Error> {
        if bool::from(self.precommit.a_prime.is_identity()) {
            return Err(Error::VerificationFailure);
        }
        let lhs = pairing(
            &self.precommit.a_prime.to_affine(),
            &self.stmt.pk.pk.to_affine(),
        );
        let rhs = pairing(&self.precommit.a_bar.to_affine(), &self.stmt.pk.g2.to_affine());
        if lhs == rhs {
            Ok(())
        } else {
            Err(Error::VerificationFailure)
        }
    }

    pub fn verify(
        &self,
        commitment: &[G1Projective],
        challenge: &Scalar,
        response: &[Scalar],
    ) -> Result<(), Error> {
        self.verify_extra()?;
        self.verify_equations(commitment, challenge, response)
    }

    pub fn simulate(
        &self,
        challenge: &Scalar,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> (Vec<G1Projective>, Vec<Scalar>) {
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
    use rand::rngs::OsRng;

    fn issue(message_count: usize, messages: Vec<Scalar>) -> (Keypair, Signature) {
        let mut rng = OsRng;
        let keypair = Keypair::new(message_count, &mut rng);
        let (creator, commitment) =
            SignatureCreator::commit(keypair.public_key(), messages, &mut rng);
        let presig = keypair.sign(commitment.commitment_message, &mut rng);
        let signature = creator.obtain_signature(presig);
        (keypair, signature)
    }

    #[test]
    fn issued_signature_verifies_directly() {
        let messages = vec![Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
        let (keypair, signature) = issue(3, messages.clone());
        assert!(signature.verify(keypair.public_key(), &messages));
    }

    #[test]
    fn tampered_message_fails_direct_verification() {
        let messages = vec![Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
        let (keypair, signature) = issue(3, messages);
        let other = vec![Scalar::from(9u64), Scalar::from(2u64), Scalar::from(3u64)];
        assert!(!signature.verify(keypair.public_key(), &other));
    }

    #[test]
    fn signature_proof_completeness() {
        let mut rng = OsRng;
        let messages = vec![Scalar::from(10u64), Scalar::from(20u64), Scalar::from(30u64)];
        let (keypair, signature) = issue(3, messages.clone());

        let secrets = vec![
            Secret::named("e"),
            Secret::named("s"),
            Secret::named("m1"),
            Secret::named("m2"),
            Secret::named("m3"),
        ];
        let stmt = SignatureProof::new(secrets, keypair.public_key().clone())
            .unwrap()
            .with_signature(signature);

        let witness = vec![signature.e, signature.s, messages[0], messages[1], messages[2]];
        let (precommit, aux) = stmt.precommit(&witness, &mut rng).unwrap();
        let instance = stmt.instantiate(precommit);

        let given_nonces = vec![None; instance.response_len()];
        let (commitment, state) = instance
            .commit(&witness, &aux, &given_nonces, &mut rng)
            .unwrap();
        let challenge = Scalar::random(&mut rng);
        let response = instance.respond(state, &challenge).unwrap();
        assert!(instance.verify(&commitment, &challenge, &response).is_ok());
    }

    #[test]
    fn simulated_transcript_fails_pairing_check() {
        let mut rng = OsRng;
        let messages = vec![Scalar::from(10u64), Scalar::from(20u64), Scalar::from(30u64)];
        let (keypair, _signature) = issue(3, messages);
        let secrets = vec![
            Secret::named("e"),
            Secret::named("s"),
            Secret::named("m1"),
            Secret::named("m2"),
            Secret::named("m3"),
        ];
        let stmt = SignatureProof::new(secrets, keypair.public_key().clone()).unwrap();
        // A verifier-shaped statement with a random (unlinked) precommitment,
        // as `simulate` would produce: the linear equations can still be
        // satisfied without a witness, but the pairing check must fail.
        let random_precommit = SignaturePrecommit {
            a_prime: G1Projective::random(&mut rng),
            a_bar: G1Projective::random(&mut rng),
            d: G1Projective::random(&mut rng),
        };
        let instance = stmt.instantiate(random_precommit);
        let challenge = Scalar::random(&mut rng);
        let (commitment, response) = instance.simulate(&challenge, &mut rng);
        assert!(instance
            .verify_equations(&commitment, &challenge, &response)
            .is_ok());
        assert!(instance.verify(&commitment, &challenge, &response).is_err());
    }
}
