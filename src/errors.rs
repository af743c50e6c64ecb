//! Error taxonomy for the statement-construction, Sigma-protocol, and
//! composition layers.
//!
//! Verification failure is the expected failure mode of a sound proof system
//! and is always returned as `Err`, never panics. Malformed statements
//! (empty expressions, missing witnesses) are configuration errors raised at
//! construction or session-start time. Calling the session state machine out
//! of order is a programming error.

use thiserror::Error;

use crate::linear_relation::GroupVar;

/// Errors produced while building or running a Sigma protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A [`GroupVar`] was read before a group element was assigned to it.
    #[error("group variable {var:?} has no element assigned")]
    UnassignedGroupVar { var: GroupVar },

    /// The witness vector handed to a Sigma protocol does not match the
    /// number of scalar variables (or the response/commitment vectors the
    /// protocol expects).
    #[error("witness or proof component has the wrong length for this statement")]
    InvalidInstanceWitnessPair,

    /// The algebraic verification equation did not hold.
    #[error("verification failed")]
    VerificationFailure,

    /// A statement was malformed at construction time: an empty expression,
    /// an `OrProof`/`AndProof` with no children, or similar.
    #[error("statement is malformed: {0}")]
    InvalidStatement(String),

    /// A named [`Secret`](crate::secret::Secret) had no assigned value in
    /// the `secret_dict` supplied to `get_prover`/`prove`.
    #[error("no witness value supplied for secret {0:?}")]
    MissingWitness(String),

    /// Two sub-statements disagreed on the value of a bound (shared-name)
    /// secret.
    #[error("binding mismatch for secret {0:?}: sub-statements disagree on its value")]
    BindingMismatch(String),

    /// A session method (`commit`, `compute_response`, `verify`, ...) was
    /// called out of the required order
    /// (`precommit -> commit -> challenge -> respond -> verify`).
    #[error("protocol call out of order: {0}")]
    ProtocolState(&'static str),
}
