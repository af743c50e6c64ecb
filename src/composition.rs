//! Conjunction (`AndProof`) and disjunction (`OrProof`) of atomic statements.
//!
//! The three atomics ([`DLRep`], [`DLRepNotEqual`], [`SignatureProof`]) each
//! reduce to a [`SchnorrProof`]-shaped Sigma protocol plus, for the latter
//! two, a non-algebraic "extra check" ([`DLRepNotEqualInstance::verify_extra`],
//! [`SignatureProofInstance::verify_extra`]) that isn't expressible as a
//! linear equation. [`Atom`] is that common shape. [`Statement`] is the
//! declarative tree a caller builds with `&`/`|`; [`Instance`] is the same
//! tree with every atomic's precommitment fixed, which is what the prover
//! and verifier actually run the protocol against.
//!
//! `SignatureProof` is the one atomic fixed to `bls12_381::G1Projective`
//! rather than generic over `G`. A `Statement<G>::Signature` leaf is only
//! usable when `G = bls12_381::G1Projective`; [`Atom::from_signature`]
//! bridges the gap with a single `std::any::Any` downcast, so that
//! everywhere else in this module — `And`/`Or` composition, binding,
//! challenge splitting, Fiat–Shamir — is written once, generically, for
//! every atomic kind.

use std::any::Any;
use std::collections::HashMap;

use ff::Field;
use group::{Group, GroupEncoding};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use crate::bbsplus::{SignatureProof, SignatureProofAux, SignatureProofInstance};
use crate::dlrep::DLRep;
use crate::dlrne::{DLRepNotEqual, DLRepNotEqualInstance};
use crate::errors::Error;
use crate::secret::{Secret, SecretMap};
use crate::serialization::serialize_elements;

fn downcast_vec<T: 'static, U: 'static>(value: Vec<T>) -> Result<Vec<U>, Error> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed
        .downcast::<Vec<U>>()
        .map(|b| *b)
        .map_err(|_| Error::InvalidStatement(kind_mismatch_message()))
}

fn downcast_one<T: 'static, U: 'static>(value: T) -> Result<U, Error> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed
        .downcast::<U>()
        .map(|b| *b)
        .map_err(|_| Error::InvalidStatement(kind_mismatch_message()))
}

fn kind_mismatch_message() -> String {
    "signature atoms require the BLS12-381 G1 group and scalar field as the \
     composition's group parameter"
        .into()
}

/// One atomic statement, reduced to a Sigma protocol over `G` plus whatever
/// non-algebraic side predicate it needs. This is the leaf unit both
/// `AndProof` and `OrProof` operate on uniformly.
enum Atom<G: Group + GroupEncoding + 'static> {
    Dlrep(DLRep<G>),
    DlrepNotEqual {
        instance: DLRepNotEqualInstance<G>,
        /// Set by the prover at precommit time; absent on the verifier's copy.
        alpha: Option<G::Scalar>,
    },
    Signature {
        instance: SignatureProofInstance,
        aux: Option<SignatureProofAux>,
    },
}

impl<G: Group + GroupEncoding + 'static> Atom<G> {
    fn secrets(&self) -> Vec<Option<Secret>> {
        match self {
            Atom::Dlrep(d) => d.secrets().iter().cloned().map(Some).collect(),
            Atom::DlrepNotEqual { instance, .. } => instance.secrets(),
            Atom::Signature { instance, .. } => instance.secrets(),
        }
    }

    fn named_secrets(&self) -> Vec<Secret> {
        self.secrets().into_iter().flatten().collect()
    }

    fn commitment_len(&self) -> usize {
        match self {
            Atom::Dlrep(d) => d.commitment_len(),
            Atom::DlrepNotEqual { instance, .. } => instance.commitment_len(),
            Atom::Signature { instance, .. } => instance.commitment_len(),
        }
    }

    fn commit(
        &self,
        named_witness: &[G::Scalar],
        named_nonces: &[Option<G::Scalar>],
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(Vec<G>, (Vec<G::Scalar>, Vec<G::Scalar>)), Error> {
        match self {
            Atom::Dlrep(d) => d.commit(named_witness, named_nonces, rng),
            Atom::DlrepNotEqual { instance, alpha } => {
                let alpha = alpha.ok_or(Error::ProtocolState(
                    "DLRepNotEqual commit called before precommit",
                ))?;
                let x_value = *named_witness
                    .first()
                    .ok_or_else(|| Error::MissingWitness("x".into()))?;
                let given_x_nonce = named_nonces.first().copied().flatten();
                instance.commit(x_value, alpha, given_x_nonce, rng)
            }
            Atom::Signature { instance, aux } => {
                let aux = aux
                    .as_ref()
                    .ok_or(Error::ProtocolState("SignatureProof commit called before precommit"))?;
                let bls_witness: Vec<bls12_381::Scalar> = downcast_vec(named_witness.to_vec())?;
                let bls_nonces: Vec<Option<bls12_381::Scalar>> = downcast_vec(named_nonces.to_vec())?;
                let (commitment, state) = instance.commit(&bls_witness, aux, &bls_nonces, rng)?;
                Ok((
                    downcast_vec(commitment)?,
                    (downcast_vec(state.0)?, downcast_vec(state.1)?),
                ))
            }
        }
    }

    fn respond(
        &self,
        state: (Vec<G::Scalar>, Vec<G::Scalar>),
        challenge: &G::Scalar,
    ) -> Result<Vec<G::Scalar>, Error> {
        match self {
            Atom::Dlrep(d) => d.respond(state, challenge),
            Atom::DlrepNotEqual { instance, .. } => instance.respond(state, challenge),
            Atom::Signature { instance, .. } => {
                let bls_state = (downcast_vec(state.0)?, downcast_vec(state.1)?);
                let bls_challenge: bls12_381::Scalar = downcast_one(*challenge)?;
                let response = instance.respond(bls_state, &bls_challenge)?;
                downcast_vec(response)
            }
        }
    }

    fn verify(&self, commitment: &[G], challenge: &G::Scalar, response: &[G::Scalar]) -> Result<(), Error> {
        match self {
            Atom::Dlrep(d) => d.verify(commitment, challenge, response),
            Atom::DlrepNotEqual { instance, .. } => instance.verify(commitment, challenge, response),
            Atom::Signature { instance, .. } => {
                let bls_commitment: Vec<bls12_381::G1Projective> = downcast_vec(commitment.to_vec())?;
                let bls_challenge: bls12_381::Scalar = downcast_one(*challenge)?;
                let bls_response: Vec<bls12_381::Scalar> = downcast_vec(response.to_vec())?;
                instance.verify(&bls_commitment, &bls_challenge, &bls_response)
            }
        }
    }

    fn simulate(
        &self,
        challenge: &G::Scalar,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(Vec<G>, Vec<G::Scalar>), Error> {
        match self {
            Atom::Dlrep(d) => Ok(d.simulate(challenge, rng)),
            Atom::DlrepNotEqual { instance, .. } => Ok(instance.simulate(challenge, rng)),
            Atom::Signature { instance, .. } => {
                let bls_challenge: bls12_381::Scalar = downcast_one(*challenge)?;
                let (commitment, response) = instance.simulate(&bls_challenge, rng);
                Ok((downcast_vec(commitment)?, downcast_vec(response)?))
            }
        }
    }

    /// The algebraic Sigma equations only, skipping `DLRepNotEqual`'s
    /// `C != 0` or `SignatureProof`'s pairing check. Used by
    /// `verify_simulation_consistency`, which checks challenge-sum
    /// consistency but not soundness.
    fn verify_equations_only(
        &self,
        commitment: &[G],
        challenge: &G::Scalar,
        response: &[G::Scalar],
    ) -> Result<(), Error> {
        match self {
            Atom::Dlrep(d) => d.verify(commitment, challenge, response),
            Atom::DlrepNotEqual { instance, .. } => {
                instance.verify_equations(commitment, challenge, response)
            }
            Atom::Signature { instance, .. } => {
                let bls_commitment: Vec<bls12_381::G1Projective> = downcast_vec(commitment.to_vec())?;
                let bls_challenge: bls12_381::Scalar = downcast_one(*challenge)?;
                let bls_response: Vec<bls12_381::Scalar> = downcast_vec(response.to_vec())?;
                instance.verify_equations(&bls_commitment, &bls_challenge, &bls_response)
            }
        }
    }

    /// Recomputes the commitment consistent with a given `(challenge,
    /// response)` pair, with no randomness involved. Used to rebuild the
    /// commitment a Fiat-Shamir transcript omits, and to simulate a branch
    /// whose response is partly pinned by a bound secret.
    fn commitment_from_response(
        &self,
        challenge: &G::Scalar,
        response: &[G::Scalar],
    ) -> Result<Vec<G>, Error> {
        match self {
            Atom::Dlrep(d) => d.commitment_from_response(challenge, response),
            Atom::DlrepNotEqual { instance, .. } => instance.commitment_from_response(challenge, response),
            Atom::Signature { instance, .. } => {
                let bls_challenge: bls12_381::Scalar = downcast_one(*challenge)?;
                let bls_response: Vec<bls12_381::Scalar> = downcast_vec(response.to_vec())?;
                let commitment = instance.commitment_from_response(&bls_challenge, &bls_response)?;
                downcast_vec(commitment)
            }
        }
    }

    /// Bridges a concrete `bls12_381::G1Projective` atom into `Atom<G>`.
    /// Succeeds (as a no-op reinterpretation) exactly when `G = bls12_381::G1Projective`.
    fn from_signature(
        instance: SignatureProofInstance,
        aux: Option<SignatureProofAux>,
    ) -> Result<Self, Error> {
        let concrete = Atom::<bls12_381::G1Projective>::Signature { instance, aux };
        let boxed: Box<dyn Any> = Box::new(concrete);
        boxed
            .downcast::<Atom<G>>()
            .map(|b| *b)
            .map_err(|_| Error::InvalidStatement(kind_mismatch_message()))
    }
}

/// The declarative statement tree a caller builds with [`Statement::and`] /
/// [`Statement::or`] or the `&`/`|` operators.
#[derive(Clone)]
pub enum Statement<G: Group + GroupEncoding + 'static> {
    Dlrep(DLRep<G>),
    DlrepNotEqual(DLRepNotEqual<G>),
    Signature(SignatureProof),
    And(Vec<Statement<G>>),
    Or(Vec<Statement<G>>),
}

impl<G: Group + GroupEncoding + 'static> Statement<G> {
    pub fn dlrep(lhs: G, expression: crate::expression::Expression<G>) -> Result<Self, Error> {
        Ok(Statement::Dlrep(DLRep::new(lhs, expression)?))
    }

    pub fn dlrep_not_equal(y0: G, g0: G, y1: G, g1: G, x: Secret, binding: bool) -> Self {
        Statement::DlrepNotEqual(DLRepNotEqual::new(y0, g0, y1, g1, x, binding))
    }

    pub fn signature(statement: SignatureProof) -> Self {
        Statement::Signature(statement)
    }

    /// Builds a conjunction, flattening any nested `And` one level at
    /// construction time so `(a & b) & c` and `a & (b & c)` produce the same
    /// three-child tree.
    pub fn and(children: Vec<Statement<G>>) -> Self {
        let mut flat = Vec::new();
        for child in children {
            match child {
                Statement::And(grandchildren) => flat.extend(grandchildren),
                other => flat.push(other),
            }
        }
        Statement::And(flat)
    }

    /// Builds a disjunction, flattening any nested `Or` one level, the same
    /// way [`Statement::and`] flattens `And`.
    pub fn or(children: Vec<Statement<G>>) -> Self {
        let mut flat = Vec::new();
        for child in children {
            match child {
                Statement::Or(grandchildren) => flat.extend(grandchildren),
                other => flat.push(other),
            }
        }
        Statement::Or(flat)
    }

    /// Every [`Secret`] referenced anywhere in the tree, in no particular
    /// order, duplicates included (a bound secret appears once per occurrence).
    pub fn secrets(&self) -> Vec<Secret> {
        match self {
            Statement::Dlrep(d) => d.secrets().to_vec(),
            Statement::DlrepNotEqual(d) => vec![d.x().clone()],
            Statement::Signature(s) => s.secrets_named().to_vec(),
            Statement::And(children) | Statement::Or(children) => {
                children.iter().flat_map(Statement::secrets).collect()
            }
        }
    }

    /// Whether `witness` actually satisfies this statement: for `And`, every
    /// child must hold; for `Or`, at least one. Used to auto-detect the real
    /// branch of a disjunction from a single shared witness map, so callers
    /// don't have to spell out which branch is the true one by hand.
    fn is_satisfiable(&self, witness: &SecretMap<G::Scalar>) -> bool {
        match self {
            Statement::Dlrep(d) => {
                let Some(values) = d
                    .secrets()
                    .iter()
                    .map(|s| witness.get(s))
                    .collect::<Option<Vec<_>>>()
                else {
                    return false;
                };
                d.holds(&values)
            }
            Statement::DlrepNotEqual(d) => witness.get(d.x()).is_some_and(|x| d.holds(x)),
            Statement::Signature(s) => {
                let Some(values) = s
                    .secrets_named()
                    .iter()
                    .map(|sec| witness.get(sec))
                    .collect::<Option<Vec<G::Scalar>>>()
                else {
                    return false;
                };
                let Ok(bls_values) = downcast_vec::<G::Scalar, bls12_381::Scalar>(values) else {
                    return false;
                };
                s.is_provable(&bls_values)
            }
            Statement::And(children) => children.iter().all(|c| c.is_satisfiable(witness)),
            Statement::Or(children) => children.iter().any(|c| c.is_satisfiable(witness)),
        }
    }
}

impl<G: Group + GroupEncoding + 'static> std::ops::BitAnd for Statement<G> {
    type Output = Statement<G>;
    fn bitand(self, rhs: Statement<G>) -> Statement<G> {
        Statement::and(vec![self, rhs])
    }
}

impl<G: Group + GroupEncoding + 'static> std::ops::BitOr for Statement<G> {
    type Output = Statement<G>;
    fn bitor(self, rhs: Statement<G>) -> Statement<G> {
        Statement::or(vec![self, rhs])
    }
}

/// The public precommitment data for a [`Statement`] tree, shaped like the
/// tree itself. Empty for the parts of the tree that need none (`DLRep`,
/// `And`/`Or` nodes contribute only their children's).
#[derive(Clone)]
pub enum Precommitment<G: Group + GroupEncoding> {
    None,
    DlrepNotEqual(G),
    Signature(crate::bbsplus::SignaturePrecommit),
    Composite(Vec<Precommitment<G>>),
}

impl<G: Group + GroupEncoding> Precommitment<G> {
    /// Canonical bytes, in tree order, folded into the statement identifier
    /// (§6.5: `STATEMENT_ID || PRECOMMITMENT_BYTES || COMMITMENT_BYTES`).
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        match self {
            Precommitment::None => Vec::new(),
            Precommitment::DlrepNotEqual(c) => serialize_elements(&[*c]),
            Precommitment::Signature(pc) => serialize_elements(&[pc.a_prime, pc.a_bar, pc.d]),
            Precommitment::Composite(parts) => parts.iter().flat_map(Precommitment::to_bytes).collect(),
        }
    }
}

/// The same shape as [`Precommitment`], carrying the prover-only randomness
/// generated alongside it (needed again at commit time). Never serialized.
enum Aux<G: Group + GroupEncoding> {
    None,
    DlrepNotEqual(G::Scalar),
    Signature(SignatureProofAux),
    Composite(Vec<Aux<G>>),
    /// An `Or` node's children, tagged with the real branch's index: unlike
    /// `Composite`, this is never ambiguous, since the real branch's own
    /// `Aux` can itself be `Aux::None` (a `DLRep` child) indistinguishable
    /// from every simulated sibling's `Aux::None`.
    Or(usize, Vec<Aux<G>>),
}

/// The prover's first message: one commitment per atom, shaped like the
/// statement tree.
#[derive(Clone)]
pub enum Commitment<G: Group + GroupEncoding> {
    Atom(Vec<G>),
    And(Vec<Commitment<G>>),
    Or(Vec<Commitment<G>>),
}

impl<G: Group + GroupEncoding> Commitment<G> {
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        match self {
            Commitment::Atom(c) => serialize_elements(c),
            Commitment::And(cs) | Commitment::Or(cs) => cs.iter().flat_map(Commitment::to_bytes).collect(),
        }
    }
}

/// The prover's final message. `Or` nodes carry one `(challenge, response)`
/// pair per child; the child challenges must sum to the challenge the `Or`
/// node itself received from its parent (the top-level Fiat–Shamir
/// challenge, for a top-level `Or`).
#[derive(Clone)]
pub enum Response<G: Group + GroupEncoding> {
    Atom(Vec<G::Scalar>),
    And(Vec<Response<G>>),
    Or(Vec<(G::Scalar, Response<G>)>),
}

/// A [`Statement`] tree with every atomic's precommitment fixed: the object
/// the prover and verifier actually drive the Sigma protocol against.
enum Instance<G: Group + GroupEncoding + 'static> {
    Atom(Atom<G>),
    And(Vec<Instance<G>>),
    /// `real` is the index, among `children`, of the branch this party
    /// actually knows a witness for (meaningful on the prover's side only;
    /// the verifier never looks at it).
    Or { real: usize, children: Vec<Instance<G>> },
}

impl<G: Group + GroupEncoding + 'static> Instance<G> {
    fn from_parts(stmt: &Statement<G>, precommitment: &Precommitment<G>) -> Result<Self, Error> {
        Self::from_parts_with_real(stmt, precommitment, None)
    }

    fn from_parts_with_real(
        stmt: &Statement<G>,
        precommitment: &Precommitment<G>,
        aux: Option<&Aux<G>>,
    ) -> Result<Self, Error> {
        match (stmt, precommitment) {
            (Statement::Dlrep(d), Precommitment::None) => Ok(Instance::Atom(Atom::Dlrep(d.clone()))),
            (Statement::DlrepNotEqual(d), Precommitment::DlrepNotEqual(c)) => {
                let alpha = match aux {
                    Some(Aux::DlrepNotEqual(a)) => Some(*a),
                    _ => None,
                };
                Ok(Instance::Atom(Atom::DlrepNotEqual {
                    instance: d.instantiate(*c),
                    alpha,
                }))
            }
            (Statement::Signature(s), Precommitment::Signature(pc)) => {
                let sig_aux = match aux {
                    Some(Aux::Signature(a)) => Some(*a),
                    _ => None,
                };
                Ok(Instance::Atom(Atom::from_signature(s.instantiate(*pc), sig_aux)?))
            }
            (Statement::And(children), Precommitment::Composite(pcs)) => {
                if children.len() != pcs.len() {
                    return Err(Error::InvalidStatement(
                        "precommitment shape does not match And statement".into(),
                    ));
                }
                let auxs: Vec<Option<&Aux<G>>> = match aux {
                    Some(Aux::Composite(as_)) if as_.len() == children.len() => {
                        as_.iter().map(Some).collect()
                    }
                    _ => vec![None; children.len()],
                };
                let parts = children
                    .iter()
                    .zip(pcs.iter())
                    .zip(auxs)
                    .map(|((c, pc), a)| Self::from_parts_with_real(c, pc, a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Instance::And(parts))
            }
            (Statement::Or(children), Precommitment::Composite(pcs)) => {
                if children.len() != pcs.len() {
                    return Err(Error::InvalidStatement(
                        "precommitment shape does not match Or statement".into(),
                    ));
                }
                let (real, auxs): (usize, Vec<Option<&Aux<G>>>) = match aux {
                    Some(Aux::Or(real, as_)) if as_.len() == children.len() => {
                        (*real, as_.iter().map(Some).collect())
                    }
                    // The verifier never supplies `aux` at all (it has no
                    // witness): `real` is meaningless on that path, so any
                    // value is fine (see the `Instance::Or` doc comment).
                    _ => (0, vec![None; children.len()]),
                };
                let parts = children
                    .iter()
                    .zip(pcs.iter())
                    .zip(auxs)
                    .map(|((c, pc), a)| Self::from_parts_with_real(c, pc, a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Instance::Or { real, children: parts })
            }
            _ => Err(Error::InvalidStatement(
                "precommitment shape does not match statement shape".into(),
            )),
        }
    }
}

/// Generates the precommitment (and, alongside it, the prover-only auxiliary
/// randomness) for the real branch of every `Or` node and for every leaf
/// along the way. Used only by the prover; the verifier receives a
/// [`Precommitment`] over the wire instead.
fn generate_precommitment<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    witness: &SecretMap<G::Scalar>,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(Precommitment<G>, Aux<G>), Error> {
    match stmt {
        Statement::Dlrep(_) => Ok((Precommitment::None, Aux::None)),
        Statement::DlrepNotEqual(d) => {
            let x_value = witness
                .get(d.x())
                .ok_or_else(|| Error::MissingWitness(d.x().name().unwrap_or("x").to_string()))?;
            let (c, alpha) = d.precommit(x_value, rng);
            Ok((Precommitment::DlrepNotEqual(c), Aux::DlrepNotEqual(alpha)))
        }
        Statement::Signature(s) => {
            let values = s
                .secrets_named()
                .iter()
                .map(|sec| {
                    witness
                        .get(sec)
                        .ok_or_else(|| Error::MissingWitness(sec.name().unwrap_or("?").to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let bls_witness: Vec<bls12_381::Scalar> = downcast_vec(values)?;
            let (pc, aux) = s.precommit(&bls_witness, rng)?;
            Ok((Precommitment::Signature(pc), Aux::Signature(aux)))
        }
        Statement::And(children) => {
            let mut pcs = Vec::with_capacity(children.len());
            let mut auxs = Vec::with_capacity(children.len());
            for child in children {
                let (pc, aux) = generate_precommitment(child, witness, rng)?;
                pcs.push(pc);
                auxs.push(aux);
            }
            Ok((Precommitment::Composite(pcs), Aux::Composite(auxs)))
        }
        Statement::Or(children) => {
            let real = children
                .iter()
                .position(|c| c.is_satisfiable(witness))
                .ok_or_else(|| Error::MissingWitness("no branch of this Or is satisfiable".into()))?;
            let mut pcs = Vec::with_capacity(children.len());
            let mut auxs = Vec::with_capacity(children.len());
            for (i, child) in children.iter().enumerate() {
                if i == real {
                    let (pc, aux) = generate_precommitment(child, witness, rng)?;
                    pcs.push(pc);
                    auxs.push(aux);
                } else {
                    pcs.push(simulate_precommitment(child, rng));
                    auxs.push(Aux::None);
                }
            }
            Ok((Precommitment::Composite(pcs), Aux::Or(real, auxs)))
        }
    }
}

/// A precommitment for a branch the prover does *not* have a witness for.
/// Only `DLRep`/`DLRepNotEqual` leaves can appear here in practice: a
/// `SignatureProof` can never be soundly simulated this way (see
/// [`SignatureProof::is_provable`]), and an `And`/`Or` node simulated wholesale
/// must have every one of its own leaves able to do the same.
fn simulate_precommitment<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    rng: &mut (impl RngCore + CryptoRng),
) -> Precommitment<G> {
    match stmt {
        Statement::Dlrep(_) => Precommitment::None,
        Statement::DlrepNotEqual(d) => Precommitment::DlrepNotEqual(d.simulate_precommitment(rng)),
        Statement::Signature(_) => {
            // No witness and no sound way to fake the pairing check; callers
            // that reach this are composing a `SignatureProof` as a
            // non-real `Or` branch, which §4.4's design ledger entry rules
            // out. Produce *some* value so traversal stays total; it will
            // fail `verify_extra` if ever checked, which is the right
            // failure mode for a statement this library does not support.
            let a_prime = G1ProjectiveFallback::random(rng);
            Precommitment::Signature(crate::bbsplus::SignaturePrecommit {
                a_prime,
                a_bar: G1ProjectiveFallback::random(rng),
                d: G1ProjectiveFallback::random(rng),
            })
        }
        Statement::And(children) | Statement::Or(children) => {
            Precommitment::Composite(children.iter().map(|c| simulate_precommitment(c, rng)).collect())
        }
    }
}

type G1ProjectiveFallback = bls12_381::G1Projective;

// ---------------------------------------------------------------------
// Session driver: binding-aware commit/respond/verify over a whole tree,
// the interactive `Prover`/`Verifier`, and the non-interactive
// prove/verify/simulate/verify_simulation_consistency wrappers.
// ---------------------------------------------------------------------

/// Opaque state a [`Prover`] carries between `commit` and `compute_response`.
enum ProverState<G: Group + GroupEncoding + 'static> {
    /// A real atomic's Schnorr prover state (nonces, witness).
    Atom((Vec<G::Scalar>, Vec<G::Scalar>)),
    /// A fully precomputed `(challenge, response)` for a simulated subtree
    /// (a non-real `Or` branch, atomic or composite).
    Fake(G::Scalar, Response<G>),
    And(Vec<ProverState<G>>),
    Or { real: usize, states: Vec<ProverState<G>> },
}

/// The `(idx, secret)` pairs, among an atom's internal scalar slots, whose
/// nonce (at commit time) or response (at simulate time) must be shared
/// with every sibling statement binding the same name. `DLRepNotEqual` only
/// contributes its `x` when `binding` is set; `Dlrep` and `Signature` always
/// bind every named slot they have.
fn bindable_secret_slots<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    atom: &Atom<G>,
) -> Vec<(usize, Secret)> {
    match (stmt, atom) {
        (Statement::Dlrep(d), Atom::Dlrep(_)) => {
            d.secrets().iter().cloned().enumerate().collect()
        }
        (Statement::DlrepNotEqual(d), Atom::DlrepNotEqual { .. }) => {
            if d.binding() {
                vec![(0, d.x().clone())]
            } else {
                Vec::new()
            }
        }
        (Statement::Signature(_), Atom::Signature { instance, .. }) => instance
            .secrets()
            .into_iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
            .collect(),
        _ => Vec::new(),
    }
}

/// The witness values for a leaf statement's *named, public* secrets, in
/// the order each atomic's `commit` expects for its `named_witness`
/// parameter (`Dlrep::secrets()` order, `[x]`, or `[e, s, m_1..m_k]`).
fn leaf_named_witness<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    witness: &SecretMap<G::Scalar>,
) -> Result<Vec<G::Scalar>, Error> {
    let secrets: Vec<Secret> = match stmt {
        Statement::Dlrep(d) => d.secrets().to_vec(),
        Statement::DlrepNotEqual(d) => vec![d.x().clone()],
        Statement::Signature(s) => s.secrets_named().to_vec(),
        _ => {
            return Err(Error::InvalidStatement(
                "expected a leaf statement".into(),
            ))
        }
    };
    secrets
        .iter()
        .map(|s| {
            witness
                .get(s)
                .ok_or_else(|| Error::MissingWitness(s.name().unwrap_or("<anonymous>").to_string()))
        })
        .collect()
}

fn commit_leaf<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    atom: &Atom<G>,
    witness: &SecretMap<G::Scalar>,
    nonce_map: &mut HashMap<Secret, G::Scalar>,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(Commitment<G>, ProverState<G>), Error> {
    let named_witness = leaf_named_witness(stmt, witness)?;
    let atom_secrets = atom.secrets();
    let mut given_nonces = vec![None; atom_secrets.len()];
    for (idx, secret) in bindable_secret_slots(stmt, atom) {
        let nonce = *nonce_map
            .entry(secret)
            .or_insert_with(|| G::Scalar::random(&mut *rng));
        given_nonces[idx] = Some(nonce);
    }
    let (commitment, state) = atom.commit(&named_witness, &given_nonces, rng)?;
    Ok((Commitment::Atom(commitment), ProverState::Atom(state)))
}

/// Builds the commitment and prover state for the *real* path through a
/// tree: `And` threads the same `nonce_map` through every child (so a
/// secret bound across siblings reuses a single nonce); `Or` commits the
/// real child for real and simulates every other child up front, each with
/// its own freshly sampled challenge.
fn commit_tree<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    instance: &Instance<G>,
    witness: &SecretMap<G::Scalar>,
    nonce_map: &mut HashMap<Secret, G::Scalar>,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(Commitment<G>, ProverState<G>), Error> {
    match (stmt, instance) {
        (Statement::Dlrep(_) | Statement::DlrepNotEqual(_) | Statement::Signature(_), Instance::Atom(atom)) => {
            commit_leaf(stmt, atom, witness, nonce_map, rng)
        }
        (Statement::And(children_s), Instance::And(children_i)) => {
            if children_s.len() != children_i.len() {
                return Err(Error::InvalidStatement(
                    "statement/instance shape mismatch in And".into(),
                ));
            }
            let mut commits = Vec::with_capacity(children_s.len());
            let mut states = Vec::with_capacity(children_s.len());
            for (cs, ci) in children_s.iter().zip(children_i) {
                let (c, s) = commit_tree(cs, ci, witness, nonce_map, rng)?;
                commits.push(c);
                states.push(s);
            }
            Ok((Commitment::And(commits), ProverState::And(states)))
        }
        (Statement::Or(children_s), Instance::Or { real, children: children_i }) => {
            if children_s.len() != children_i.len() {
                return Err(Error::InvalidStatement(
                    "statement/instance shape mismatch in Or".into(),
                ));
            }
            let mut commits = Vec::with_capacity(children_s.len());
            let mut states = Vec::with_capacity(children_s.len());
            for (i, (cs, ci)) in children_s.iter().zip(children_i).enumerate() {
                if i == *real {
                    let (c, s) = commit_tree(cs, ci, witness, nonce_map, rng)?;
                    commits.push(c);
                    states.push(s);
                } else {
                    let fake_challenge = G::Scalar::random(&mut *rng);
                    let (c, r) = simulate_subtree(cs, ci, fake_challenge, rng)?;
                    commits.push(c);
                    states.push(ProverState::Fake(fake_challenge, r));
                }
            }
            Ok((Commitment::Or(commits), ProverState::Or { real: *real, states }))
        }
        _ => Err(Error::InvalidStatement(
            "statement/instance shape mismatch".into(),
        )),
    }
}

/// Simulates a whole subtree (atomic, `And`, or `Or`) for a given
/// challenge, with no witness. Used for the non-real branches of an `Or`
/// and for [`Statement::simulate`]. A bound secret shared between two
/// children of a simulated `And` is not kept consistent across them (no
/// verifier ever checks binding on a simulated tree; see `DESIGN.md`).
fn simulate_subtree<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    instance: &Instance<G>,
    challenge: G::Scalar,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(Commitment<G>, Response<G>), Error> {
    match (stmt, instance) {
        (Statement::Dlrep(_) | Statement::DlrepNotEqual(_) | Statement::Signature(_), Instance::Atom(atom)) => {
            let (commitment, response) = atom.simulate(&challenge, rng)?;
            Ok((Commitment::Atom(commitment), Response::Atom(response)))
        }
        (Statement::And(children_s), Instance::And(children_i)) => {
            let mut commits = Vec::with_capacity(children_s.len());
            let mut responses = Vec::with_capacity(children_s.len());
            for (cs, ci) in children_s.iter().zip(children_i) {
                let (c, r) = simulate_subtree(cs, ci, challenge, rng)?;
                commits.push(c);
                responses.push(r);
            }
            Ok((Commitment::And(commits), Response::And(responses)))
        }
        (Statement::Or(children_s), Instance::Or { children: children_i, .. }) => {
            let n = children_s.len();
            if n == 0 {
                return Err(Error::InvalidStatement("Or statement has no children".into()));
            }
            let mut challenges = Vec::with_capacity(n);
            let mut acc = G::Scalar::ZERO;
            for _ in 0..n - 1 {
                let c = G::Scalar::random(&mut *rng);
                acc += c;
                challenges.push(c);
            }
            challenges.push(challenge - acc);

            let mut commits = Vec::with_capacity(n);
            let mut pairs = Vec::with_capacity(n);
            for ((cs, ci), c_i) in children_s.iter().zip(children_i).zip(challenges) {
                let (commitment, response) = simulate_subtree(cs, ci, c_i, rng)?;
                commits.push(commitment);
                pairs.push((c_i, response));
            }
            Ok((Commitment::Or(commits), Response::Or(pairs)))
        }
        _ => Err(Error::InvalidStatement(
            "statement/instance shape mismatch".into(),
        )),
    }
}

/// Computes the response for every node of a tree given its prover state
/// and a top-level challenge; an `Or` node splits its received challenge
/// between its real branch (by subtraction) and its already-fixed
/// simulated branches.
fn respond_tree<G: Group + GroupEncoding + 'static>(
    instance: &Instance<G>,
    state: ProverState<G>,
    challenge: G::Scalar,
) -> Result<Response<G>, Error> {
    match (instance, state) {
        (Instance::Atom(atom), ProverState::Atom(schnorr_state)) => {
            Ok(Response::Atom(atom.respond(schnorr_state, &challenge)?))
        }
        (Instance::And(children_i), ProverState::And(states)) => {
            if children_i.len() != states.len() {
                return Err(Error::InvalidStatement(
                    "instance/prover-state shape mismatch in And".into(),
                ));
            }
            let mut out = Vec::with_capacity(children_i.len());
            for (ci, s) in children_i.iter().zip(states) {
                out.push(respond_tree(ci, s, challenge)?);
            }
            Ok(Response::And(out))
        }
        (Instance::Or { real, children }, ProverState::Or { real: real2, states }) => {
            if *real != real2 {
                return Err(Error::InvalidStatement(
                    "prover state does not match this Or's real branch".into(),
                ));
            }
            let fake_sum = states
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != *real)
                .map(|(_, s)| match s {
                    ProverState::Fake(c, _) => Ok(*c),
                    _ => Err(Error::InvalidStatement(
                        "expected a simulated branch state".into(),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .fold(G::Scalar::ZERO, |a, b| a + b);
            let real_challenge = challenge - fake_sum;

            let mut pairs = Vec::with_capacity(children.len());
            for (i, (ci, s)) in children.iter().zip(states).enumerate() {
                if i == *real {
                    let resp = respond_tree(ci, s, real_challenge)?;
                    pairs.push((real_challenge, resp));
                } else {
                    match s {
                        ProverState::Fake(c, r) => pairs.push((c, r)),
                        _ => {
                            return Err(Error::InvalidStatement(
                                "expected a simulated branch state".into(),
                            ))
                        }
                    }
                }
            }
            Ok(Response::Or(pairs))
        }
        _ => Err(Error::InvalidStatement(
            "instance/prover-state shape mismatch".into(),
        )),
    }
}

/// Recomputes a tree's commitment from its `(challenge, response)`,
/// checking every `Or` node's challenge-sum along the way. Used to verify
/// a Fiat-Shamir transcript, which never carries the commitment itself.
fn recompute_commitment<G: Group + GroupEncoding + 'static>(
    instance: &Instance<G>,
    challenge: G::Scalar,
    response: &Response<G>,
) -> Result<Commitment<G>, Error> {
    match (instance, response) {
        (Instance::Atom(atom), Response::Atom(r)) => {
            Ok(Commitment::Atom(atom.commitment_from_response(&challenge, r)?))
        }
        (Instance::And(children_i), Response::And(rs)) => {
            if children_i.len() != rs.len() {
                return Err(Error::InvalidStatement(
                    "instance/response shape mismatch in And".into(),
                ));
            }
            let mut out = Vec::with_capacity(children_i.len());
            for (ci, rr) in children_i.iter().zip(rs) {
                out.push(recompute_commitment(ci, challenge, rr)?);
            }
            Ok(Commitment::And(out))
        }
        (Instance::Or { children, .. }, Response::Or(pairs)) => {
            if children.len() != pairs.len() {
                return Err(Error::InvalidStatement(
                    "instance/response shape mismatch in Or".into(),
                ));
            }
            let sum = pairs.iter().fold(G::Scalar::ZERO, |a, (c, _)| a + *c);
            if sum != challenge {
                return Err(Error::VerificationFailure);
            }
            let mut out = Vec::with_capacity(children.len());
            for (ci, (c_i, r_i)) in children.iter().zip(pairs) {
                out.push(recompute_commitment(ci, *c_i, r_i)?);
            }
            Ok(Commitment::Or(out))
        }
        _ => Err(Error::InvalidStatement(
            "instance/response shape mismatch".into(),
        )),
    }
}

/// Verifies every node's own Sigma equation (and, if `check_extra`, each
/// atomic's non-algebraic side condition), checking every `Or` node's
/// challenge-sum along the way.
fn verify_tree<G: Group + GroupEncoding + 'static>(
    instance: &Instance<G>,
    challenge: G::Scalar,
    commitment: &Commitment<G>,
    response: &Response<G>,
    check_extra: bool,
) -> Result<(), Error> {
    match (instance, commitment, response) {
        (Instance::Atom(atom), Commitment::Atom(c), Response::Atom(r)) => {
            if check_extra {
                atom.verify(c, &challenge, r)
            } else {
                atom.verify_equations_only(c, &challenge, r)
            }
        }
        (Instance::And(children_i), Commitment::And(cs), Response::And(rs)) => {
            if children_i.len() != cs.len() || cs.len() != rs.len() {
                return Err(Error::InvalidStatement(
                    "instance/commitment/response shape mismatch in And".into(),
                ));
            }
            for ((ci, cc), rr) in children_i.iter().zip(cs).zip(rs) {
                verify_tree(ci, challenge, cc, rr, check_extra)?;
            }
            Ok(())
        }
        (Instance::Or { children, .. }, Commitment::Or(cs), Response::Or(pairs)) => {
            if children.len() != cs.len() || cs.len() != pairs.len() {
                return Err(Error::InvalidStatement(
                    "instance/commitment/response shape mismatch in Or".into(),
                ));
            }
            let sum = pairs.iter().fold(G::Scalar::ZERO, |a, (c, _)| a + *c);
            if sum != challenge {
                return Err(Error::VerificationFailure);
            }
            for ((ci, cc), (c_i, r_i)) in children.iter().zip(cs).zip(pairs) {
                verify_tree(ci, *c_i, cc, r_i, check_extra)?;
            }
            Ok(())
        }
        _ => Err(Error::InvalidStatement(
            "instance/commitment/response shape mismatch".into(),
        )),
    }
}

fn check_or_insert<F: PartialEq + Copy>(
    bound: &mut HashMap<Secret, F>,
    secret: &Secret,
    value: F,
) -> Result<(), Error> {
    if let Some(existing) = bound.get(secret) {
        if *existing != value {
            return Err(Error::BindingMismatch(
                secret.name().unwrap_or("<anonymous>").to_string(),
            ));
        }
    } else {
        bound.insert(secret.clone(), value);
    }
    Ok(())
}

/// Checks that every named secret shared between sibling leaves of the same
/// `And` subtree was given the same response value. `Or` branches are
/// isolated from each other and from their surroundings: only one of them
/// is ever real, so there is nothing to bind across them (§4.5/§4.6).
fn check_binding<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    instance: &Instance<G>,
    response: &Response<G>,
) -> Result<(), Error> {
    let mut bound = HashMap::new();
    collect_and_check(stmt, instance, response, &mut bound)
}

fn collect_and_check<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    instance: &Instance<G>,
    response: &Response<G>,
    bound: &mut HashMap<Secret, G::Scalar>,
) -> Result<(), Error> {
    match (stmt, instance, response) {
        (Statement::Dlrep(d), Instance::Atom(_), Response::Atom(r)) => {
            for (secret, value) in d.secrets().iter().zip(r) {
                check_or_insert(bound, secret, *value)?;
            }
            Ok(())
        }
        (Statement::DlrepNotEqual(d), Instance::Atom(_), Response::Atom(r)) => {
            if d.binding() {
                check_or_insert(bound, d.x(), r[0])?;
            }
            Ok(())
        }
        (Statement::Signature(_), Instance::Atom(Atom::Signature { instance, .. }), Response::Atom(r)) => {
            for (slot, value) in instance.secrets().into_iter().zip(r) {
                if let Some(secret) = slot {
                    check_or_insert(bound, &secret, *value)?;
                }
            }
            Ok(())
        }
        (Statement::And(children_s), Instance::And(children_i), Response::And(rs)) => {
            for ((cs, ci), rr) in children_s.iter().zip(children_i).zip(rs) {
                collect_and_check(cs, ci, rr, bound)?;
            }
            Ok(())
        }
        (Statement::Or(children_s), Instance::Or { children: children_i, .. }, Response::Or(pairs)) => {
            for ((cs, ci), (_, rr)) in children_s.iter().zip(children_i).zip(pairs) {
                // Each branch's own internal binding is still checked, but
                // in isolation: a shared name straddling two Or branches
                // does not bind (at most one branch is ever real).
                check_binding(cs, ci, rr)?;
            }
            Ok(())
        }
        _ => Err(Error::InvalidStatement(
            "statement/instance/response shape mismatch".into(),
        )),
    }
}

fn verify_full<G: Group + GroupEncoding + 'static>(
    stmt: &Statement<G>,
    instance: &Instance<G>,
    challenge: G::Scalar,
    commitment: &Commitment<G>,
    response: &Response<G>,
    check_extra: bool,
) -> Result<(), Error> {
    verify_tree(instance, challenge, commitment, response, check_extra)?;
    if check_extra {
        check_binding(stmt, instance, response)?;
    }
    Ok(())
}

/// The canonical byte identifier of a statement's public parameters
/// (§6.5): `STATEMENT_ID || PRECOMMITMENT_BYTES || COMMITMENT_BYTES` is
/// what gets hashed into the Fiat-Shamir challenge. This covers the
/// `STATEMENT_ID` part; distinct from (and coarser than) the
/// duplex-sponge-based [`crate::codec::Codec`] used by the single-statement
/// convenience layer in [`crate::fiat_shamir`]/[`crate::proof_builder`].
fn statement_id<G: Group + GroupEncoding + 'static>(stmt: &Statement<G>) -> Vec<u8> {
    let mut out = Vec::new();
    encode_statement_id(stmt, &mut out);
    out
}

fn encode_statement_id<G: Group + GroupEncoding + 'static>(stmt: &Statement<G>, out: &mut Vec<u8>) {
    match stmt {
        Statement::Dlrep(d) => {
            out.push(0);
            out.extend(serialize_elements(&[d.lhs()]));
            out.extend(serialize_elements(d.generators()));
            out.extend(d.label());
        }
        Statement::DlrepNotEqual(d) => {
            out.push(1);
            out.extend(d.public_bytes());
        }
        Statement::Signature(s) => {
            out.push(2);
            out.extend(s.public_bytes());
        }
        Statement::And(children) => {
            out.push(3);
            out.extend((children.len() as u32).to_le_bytes());
            for child in children {
                encode_statement_id(child, out);
            }
        }
        Statement::Or(children) => {
            out.push(4);
            out.extend((children.len() as u32).to_le_bytes());
            for child in children {
                encode_statement_id(child, out);
            }
        }
    }
}

/// Derives the Fiat-Shamir challenge from the statement identifier, the
/// precommitment bytes, and the commitment bytes, by seeding a CSPRNG from
/// a SHA-256 digest of their concatenation (the same bias-free
/// hash-to-field technique [`crate::codec::DuplexSpongeCodec`] uses, pinned
/// here to SHA-256 rather than a sponge per the composition layer's own
/// domain separation).
fn derive_challenge<G: Group + GroupEncoding + 'static>(
    statement_id: &[u8],
    precommitment_bytes: &[u8],
    commitment_bytes: &[u8],
) -> G::Scalar {
    let mut hasher = Sha256::new();
    hasher.update(b"sigma-compose/composition/challenge");
    hasher.update(statement_id);
    hasher.update(precommitment_bytes);
    hasher.update(commitment_bytes);
    let digest = hasher.finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    let mut rng = ChaCha20Rng::from_seed(seed);
    G::Scalar::random(&mut rng)
}

/// A complete non-interactive transcript: the precommitment, the
/// Fiat-Shamir challenge, and the response. The commitment itself is not
/// carried (§6.4); verification recomputes it from the verification
/// equation.
#[derive(Clone)]
pub struct Transcript<G: Group + GroupEncoding + 'static> {
    precommitment: Precommitment<G>,
    challenge: G::Scalar,
    response: Response<G>,
}

/// A live proving session bound to one [`Statement`] and witness, driven
/// through `precommit -> commit -> compute_response` in that order.
pub struct Prover<'s, G: Group + GroupEncoding + 'static> {
    stmt: &'s Statement<G>,
    witness: SecretMap<G::Scalar>,
    precommitment: Option<Precommitment<G>>,
    aux: Option<Aux<G>>,
    state: Option<ProverState<G>>,
}

impl<'s, G: Group + GroupEncoding + 'static> Prover<'s, G> {
    /// The optional pre-Sigma message: samples `DLRepNotEqual`/`SignatureProof`
    /// precommitments for the real path (and simulated ones for every
    /// non-real `Or` branch). A no-op, but still required, for a tree made
    /// only of `Dlrep` leaves.
    pub fn precommit(&mut self, rng: &mut (impl RngCore + CryptoRng)) -> Result<Precommitment<G>, Error> {
        if self.precommitment.is_some() {
            return Err(Error::ProtocolState("precommit called twice"));
        }
        let (precommitment, aux) = generate_precommitment(self.stmt, &self.witness, rng)?;
        self.precommitment = Some(precommitment.clone());
        self.aux = Some(aux);
        Ok(precommitment)
    }

    /// The prover's first Sigma message.
    pub fn commit(&mut self, rng: &mut (impl RngCore + CryptoRng)) -> Result<Commitment<G>, Error> {
        let precommitment = self
            .precommitment
            .as_ref()
            .ok_or(Error::ProtocolState("commit called before precommit"))?;
        if self.state.is_some() {
            return Err(Error::ProtocolState("commit called twice"));
        }
        let aux = self.aux.as_ref().expect("aux set alongside precommitment");
        let instance = Instance::from_parts_with_real(self.stmt, precommitment, Some(aux))?;
        let mut nonce_map = HashMap::new();
        let (commitment, state) = commit_tree(self.stmt, &instance, &self.witness, &mut nonce_map, rng)?;
        self.state = Some(state);
        Ok(commitment)
    }

    /// The prover's second Sigma message, for a verifier-supplied challenge.
    pub fn compute_response(&mut self, challenge: G::Scalar) -> Result<Response<G>, Error> {
        let precommitment = self
            .precommitment
            .as_ref()
            .ok_or(Error::ProtocolState("compute_response called before precommit"))?;
        let state = self
            .state
            .take()
            .ok_or(Error::ProtocolState("compute_response called before commit"))?;
        // Reuse `self.aux`, not `Instance::from_parts`: an `Or` node's real
        // branch index must agree with the one `commit()` used to build
        // `state`, and only the aux-carrying reconstruction recovers it.
        let instance = Instance::from_parts_with_real(self.stmt, precommitment, self.aux.as_ref())?;
        respond_tree(&instance, state, challenge)
    }
}

/// A live verification session bound to one [`Statement`], driven through
/// `process_precommitment -> send_challenge -> verify` in that order.
pub struct Verifier<'s, G: Group + GroupEncoding + 'static> {
    stmt: &'s Statement<G>,
    precommitment: Option<Precommitment<G>>,
    commitment: Option<Commitment<G>>,
    challenge: Option<G::Scalar>,
}

impl<'s, G: Group + GroupEncoding + 'static> Verifier<'s, G> {
    pub fn process_precommitment(&mut self, precommitment: Precommitment<G>) -> Result<(), Error> {
        if self.precommitment.is_some() {
            return Err(Error::ProtocolState("process_precommitment called twice"));
        }
        self.precommitment = Some(precommitment);
        Ok(())
    }

    /// Samples a uniformly random challenge once the prover's commitment is
    /// in hand.
    pub fn send_challenge(
        &mut self,
        commitment: Commitment<G>,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<G::Scalar, Error> {
        if self.precommitment.is_none() {
            return Err(Error::ProtocolState(
                "send_challenge called before process_precommitment",
            ));
        }
        if self.commitment.is_some() {
            return Err(Error::ProtocolState("send_challenge called twice"));
        }
        let challenge = G::Scalar::random(rng);
        self.commitment = Some(commitment);
        self.challenge = Some(challenge);
        Ok(challenge)
    }

    pub fn verify(&self, response: &Response<G>) -> Result<(), Error> {
        let precommitment = self
            .precommitment
            .as_ref()
            .ok_or(Error::ProtocolState("verify called before process_precommitment"))?;
        let commitment = self
            .commitment
            .as_ref()
            .ok_or(Error::ProtocolState("verify called before send_challenge"))?;
        let challenge = self
            .challenge
            .ok_or(Error::ProtocolState("verify called before send_challenge"))?;
        let instance = Instance::from_parts(self.stmt, precommitment)?;
        verify_full(self.stmt, &instance, challenge, commitment, response, true)
    }
}

impl<G: Group + GroupEncoding + 'static> Statement<G> {
    /// Starts a proving session. Fails immediately (rather than partway
    /// through `commit`) if `witness` does not actually satisfy this
    /// statement (no branch of some `Or` holds, a required secret is
    /// missing, ...).
    pub fn get_prover(&self, witness: SecretMap<G::Scalar>) -> Result<Prover<'_, G>, Error> {
        if !self.is_satisfiable(&witness) {
            return Err(Error::MissingWitness(
                "the supplied witness does not satisfy this statement".into(),
            ));
        }
        Ok(Prover {
            stmt: self,
            witness,
            precommitment: None,
            aux: None,
            state: None,
        })
    }

    pub fn get_verifier(&self) -> Verifier<'_, G> {
        Verifier {
            stmt: self,
            precommitment: None,
            commitment: None,
            challenge: None,
        }
    }

    /// Runs a full non-interactive proof: precommit, commit, derive the
    /// Fiat-Shamir challenge from the statement identifier and the
    /// precommitment/commitment bytes, then respond.
    pub fn prove(
        &self,
        witness: SecretMap<G::Scalar>,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Transcript<G>, Error> {
        let mut prover = self.get_prover(witness)?;
        let precommitment = prover.precommit(rng)?;
        let commitment = prover.commit(rng)?;
        let challenge = derive_challenge::<G>(
            &statement_id(self),
            &precommitment.to_bytes(),
            &commitment.to_bytes(),
        );
        let response = prover.compute_response(challenge)?;
        Ok(Transcript {
            precommitment,
            challenge,
            response,
        })
    }

    /// Verifies a non-interactive transcript: recomputes the commitment
    /// from the verification equation, checks the Fiat-Shamir hash, then
    /// checks every atomic's full (equations + extra) verification and the
    /// tree's binding constraints.
    pub fn verify(&self, transcript: &Transcript<G>) -> bool {
        self.verify_inner(transcript).is_ok()
    }

    fn verify_inner(&self, transcript: &Transcript<G>) -> Result<(), Error> {
        let instance = Instance::from_parts(self, &transcript.precommitment)?;
        let commitment = recompute_commitment(&instance, transcript.challenge, &transcript.response)?;
        let expected_challenge = derive_challenge::<G>(
            &statement_id(self),
            &transcript.precommitment.to_bytes(),
            &commitment.to_bytes(),
        );
        if expected_challenge != transcript.challenge {
            return Err(Error::VerificationFailure);
        }
        verify_full(self, &instance, transcript.challenge, &commitment, &transcript.response, true)
    }

    /// Produces a transcript that satisfies the tree's verification
    /// equations and every `Or` node's challenge-sum without any witness,
    /// by simulating every leaf. Always succeeds; the challenge is sampled
    /// uniformly, not derived from a hash, so the result never passes
    /// [`Statement::verify`] (see [`Statement::verify_simulation_consistency`]).
    pub fn simulate(&self, rng: &mut (impl RngCore + CryptoRng)) -> Result<Transcript<G>, Error> {
        let precommitment = simulate_precommitment(self, rng);
        let instance = Instance::from_parts(self, &precommitment)?;
        let challenge = G::Scalar::random(rng);
        let (_commitment, response) = simulate_subtree(self, &instance, challenge, rng)?;
        Ok(Transcript {
            precommitment,
            challenge,
            response,
        })
    }

    /// Checks that a transcript's equations and `Or` challenge-sums are
    /// internally consistent, without checking the Fiat-Shamir hash, any
    /// atomic's extra non-algebraic condition, or cross-statement binding.
    /// A transcript from [`Statement::simulate`] always passes this even
    /// though it never passes [`Statement::verify`].
    pub fn verify_simulation_consistency(&self, transcript: &Transcript<G>) -> bool {
        (|| -> Result<(), Error> {
            let instance = Instance::from_parts(self, &transcript.precommitment)?;
            let commitment = recompute_commitment(&instance, transcript.challenge, &transcript.response)?;
            verify_full(self, &instance, transcript.challenge, &commitment, &transcript.response, false)
        })()
        .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::ristretto::RistrettoPoint as Ristretto;
    use ff::Field;
    use group::Group as _;
    use rand::rngs::OsRng;

    #[test]
    fn dlrep_is_satisfiable_checks_the_relation() {
        let g = Ristretto::generator();
        let x = Secret::named("x");
        let witness = <Ristretto as Group>::Scalar::from(3u64);
        let y = g * witness;
        let stmt = Statement::dlrep(y, x.clone() * g).unwrap();
        let map = SecretMap::new().with(&x, witness);
        assert!(stmt.is_satisfiable(&map));

        let wrong = SecretMap::new().with(&x, <Ristretto as Group>::Scalar::from(4u64));
        assert!(!stmt.is_satisfiable(&wrong));
    }

    #[test]
    fn and_flattens_nested_and_one_level() {
        let g = Ristretto::generator();
        let x = Secret::named("x");
        let mk = |v: u64| {
            let w = <Ristretto as Group>::Scalar::from(v);
            Statement::dlrep(g * w, x.clone() * g).unwrap()
        };
        let nested = Statement::and(vec![mk(1), Statement::and(vec![mk(2), mk(3)])]);
        match nested {
            Statement::And(children) => assert_eq!(children.len(), 3),
            _ => panic!("expected And"),
        }
    }

    #[test]
    fn or_auto_detects_satisfiable_branch() {
        let mut rng = OsRng;
        let g = Ristretto::generator();
        let x = Secret::named("x");
        let real_witness = <Ristretto as Group>::Scalar::from(7u64);
        let real = Statement::dlrep(g * real_witness, x.clone() * g).unwrap();
        let bogus_target = Ristretto::random(&mut rng);
        let bogus = Statement::dlrep(bogus_target, x.clone() * g).unwrap();

        let tree = Statement::or(vec![bogus, real]);
        let map = SecretMap::new().with(&x, real_witness);
        assert!(tree.is_satisfiable(&map));
        match &tree {
            Statement::Or(children) => {
                assert!(!children[0].is_satisfiable(&map));
                assert!(children[1].is_satisfiable(&map));
            }
            _ => unreachable!(),
        }
    }
}
