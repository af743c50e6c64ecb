//! Fiat-Shamir codec: turns an absorbed transcript into a challenge scalar.
//!
//! A [`Codec`] wraps a [`DuplexSponge`](crate::duplex_sponge::DuplexSponge)
//! keyed by a domain separator ("IV"). Prover messages are absorbed in
//! order; a challenge is derived by squeezing sponge output and using it to
//! seed a `ChaCha20` stream that samples a uniform field element, avoiding
//! modular-reduction bias for fields whose order isn't a power of two.

use std::marker::PhantomData;

use ff::Field;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::duplex_sponge::{DuplexSponge, KeccakDuplexSponge, ShakeDuplexSponge};

/// A Fiat-Shamir transcript codec, generic over the challenge field.
pub trait Codec: Clone {
    type Challenge;

    /// Initializes the codec with a domain separator.
    fn new(iv: &[u8]) -> Self;

    /// Absorbs a prover message into the running transcript state.
    fn prover_message(&mut self, data: &[u8]) -> &mut Self;

    /// Squeezes the current transcript state into a challenge scalar.
    fn verifier_challenge(&mut self) -> Self::Challenge;
}

/// A [`Codec`] backed by any [`DuplexSponge`] implementation.
#[derive(Clone)]
pub struct DuplexSpongeCodec<F, S> {
    sponge: S,
    _field: PhantomData<F>,
}

impl<F: Field, S: DuplexSponge> Codec for DuplexSpongeCodec<F, S> {
    type Challenge = F;

    fn new(iv: &[u8]) -> Self {
        Self {
            sponge: S::new(iv),
            _field: PhantomData,
        }
    }

    fn prover_message(&mut self, data: &[u8]) -> &mut Self {
        self.sponge.absorb(data);
        self
    }

    fn verifier_challenge(&mut self) -> F {
        let mut seed = [0u8; 32];
        self.sponge.squeeze(&mut seed);
        let mut rng = ChaCha20Rng::from_seed(seed);
        F::random(&mut rng)
    }
}

/// Convenience alias: a SHAKE256-backed codec for group `G`'s scalar field.
pub type ShakeCodec<G> = DuplexSpongeCodec<<G as group::Group>::Scalar, ShakeDuplexSponge>;

/// Convenience alias: a Keccak-backed codec for group `G`'s scalar field.
pub type KeccakCodec<G> = DuplexSpongeCodec<<G as group::Group>::Scalar, KeccakDuplexSponge>;
