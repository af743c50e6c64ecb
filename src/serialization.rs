//! Canonical byte encodings for group elements and scalars.
//!
//! Points use their [`GroupEncoding`] representation; scalars use
//! [`PrimeField::to_repr`]/`from_repr`. Both are fixed-width per group, so
//! vectors are encoded by straight concatenation and decoded by chunking.

use ff::PrimeField;
use group::{Group, GroupEncoding};

/// Encodes a slice of group elements by concatenating their canonical
/// fixed-width representations.
pub fn serialize_elements<G: GroupEncoding>(elements: &[G]) -> Vec<u8> {
    let mut out = Vec::new();
    for elem in elements {
        out.extend_from_slice(elem.to_bytes().as_ref());
    }
    out
}

/// Decodes `count` group elements from a concatenated byte buffer.
///
/// Returns `None` if the buffer length is wrong or any chunk fails to decode
/// to a valid group element.
pub fn deserialize_elements<G: GroupEncoding>(data: &[u8], count: usize) -> Option<Vec<G>> {
    let elem_len = <G::Repr as Default>::default().as_ref().len();
    if data.len() != elem_len * count {
        return None;
    }
    let mut out = Vec::with_capacity(count);
    for chunk in data.chunks_exact(elem_len) {
        let mut repr = G::Repr::default();
        repr.as_mut().copy_from_slice(chunk);
        let elem = Option::<G>::from(G::from_bytes(&repr))?;
        out.push(elem);
    }
    Some(out)
}

/// Encodes a slice of scalars by concatenating their canonical fixed-width
/// representations.
pub fn serialize_scalars<G: Group>(scalars: &[G::Scalar]) -> Vec<u8> {
    let mut out = Vec::new();
    for scalar in scalars {
        out.extend_from_slice(scalar.to_repr().as_ref());
    }
    out
}

/// Decodes `count` scalars from a concatenated byte buffer.
pub fn deserialize_scalars<G: Group>(data: &[u8], count: usize) -> Option<Vec<G::Scalar>> {
    let scalar_len = <<G::Scalar as PrimeField>::Repr as Default>::default()
        .as_ref()
        .len();
    if data.len() != scalar_len * count {
        return None;
    }
    let mut out = Vec::with_capacity(count);
    for chunk in data.chunks_exact(scalar_len) {
        let mut repr = <G::Scalar as PrimeField>::Repr::default();
        repr.as_mut().copy_from_slice(chunk);
        let scalar = Option::<G::Scalar>::from(G::Scalar::from_repr(repr))?;
        out.push(scalar);
    }
    Some(out)
}
