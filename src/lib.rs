//
// Authors:
// - Nugzari Uzoevi <nougzarm@icloud.com>
// - Michele Orrù <m@orru.net>
// - Lénaïck Gouriou <lg@leanear.io>

#![allow(non_snake_case)]
//! A toolkit for composing zero-knowledge Sigma protocols: build a statement
//! out of `DLRep`/`DLRepNotEqual`/`SignatureProof` atoms, combine them with
//! `&`/`|` into `AndProof`/`OrProof` trees, and drive either the interactive
//! three-move protocol or the Fiat-Shamir non-interactive variant against the
//! result.
//!

#![deny(unused_variables)]
#![deny(unused_mut)]

pub mod secret;
pub mod expression;
pub mod dlrep;
pub mod dlrne;
pub mod bbsplus;
pub mod composition;
pub mod errors;
pub mod fiat_shamir;
pub mod proof_builder;
pub mod serialization;
pub mod linear_relation;
pub mod schnorr_protocol;
pub mod traits;

pub mod codec;
pub mod duplex_sponge;

pub use composition::{Commitment, Precommitment, Prover, Response, Statement, Transcript, Verifier};
pub use errors::Error;
pub use linear_relation::LinearRelation;
pub use secret::{Secret, SecretMap};
