//! Minimal duplex-sponge abstraction backing the Fiat-Shamir [`Codec`](crate::codec::Codec).
//!
//! A duplex sponge absorbs prover messages and squeezes verifier challenges
//! from the same running state, which is what lets [`crate::codec::Codec`]
//! fold an arbitrary sequence of commitments into one challenge without
//! needing to buffer them.

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;
use tiny_keccak::{Hasher, Keccak};

/// A sponge construction with `absorb`/`squeeze` operations, initialized from
/// an arbitrary-length domain separator (the "IV").
pub trait DuplexSponge: Clone {
    fn new(iv: &[u8]) -> Self;
    fn absorb(&mut self, data: &[u8]);
    fn squeeze(&mut self, out: &mut [u8]);
}

/// SHAKE256-backed duplex sponge (via `sha3`).
#[derive(Clone)]
pub struct ShakeDuplexSponge {
    state: Vec<u8>,
}

impl DuplexSponge for ShakeDuplexSponge {
    fn new(iv: &[u8]) -> Self {
        Self { state: iv.to_vec() }
    }

    fn absorb(&mut self, data: &[u8]) {
        self.state.extend_from_slice(data);
    }

    fn squeeze(&mut self, out: &mut [u8]) {
        let mut hasher = Shake256::default();
        Update::update(&mut hasher, &self.state);
        let mut reader = hasher.finalize_xof();
        reader.read(out);
        // Ratchet the state forward so a repeated squeeze yields fresh output.
        self.state.extend_from_slice(out);
    }
}

/// Keccak-`f`-backed duplex sponge (via `tiny-keccak`), used as the codec
/// for batchable/compact proof serialization where a fixed-rate sponge is
/// preferred over SHAKE's XOF interface.
#[derive(Clone)]
pub struct KeccakDuplexSponge {
    state: Vec<u8>,
}

impl DuplexSponge for KeccakDuplexSponge {
    fn new(iv: &[u8]) -> Self {
        Self { state: iv.to_vec() }
    }

    fn absorb(&mut self, data: &[u8]) {
        self.state.extend_from_slice(data);
    }

    fn squeeze(&mut self, out: &mut [u8]) {
        let mut keccak = Keccak::v256();
        keccak.update(&self.state);
        let mut digest = [0u8; 32];
        keccak.finalize(&mut digest);
        let n = out.len().min(digest.len());
        out[..n].copy_from_slice(&digest[..n]);
        for (i, byte) in out.iter_mut().enumerate().skip(n) {
            *byte = digest[i % digest.len()];
        }
        self.state.extend_from_slice(&digest);
    }
}
