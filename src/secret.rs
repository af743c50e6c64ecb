//! Witness placeholders ([`Secret`]) and their value bindings ([`SecretMap`]).
//!
//! A [`Secret`] is a named or anonymous placeholder for a scalar witness. Two
//! `Secret`s with the same explicit name denote the *same* scalar everywhere
//! they occur in a statement tree (the "binding" semantics of §3/§4.5 of the
//! design); a `Secret` created without a name is distinct from every other
//! `Secret`, including another unnamed one, by object identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ANONYMOUS_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum SecretId {
    Named(String),
    Anonymous(u64),
}

/// A witness placeholder: identified either by an explicit, shareable name
/// or by a unique internal id (object identity).
#[derive(Clone, Eq)]
pub struct Secret {
    id: SecretId,
}

impl Secret {
    /// Creates a fresh, anonymous secret, distinct from every other secret.
    pub fn new() -> Self {
        let id = NEXT_ANONYMOUS_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id: SecretId::Anonymous(id),
        }
    }

    /// Creates a named secret. Every `Secret::named` call with the same
    /// name denotes the same witness variable, wherever it appears in a
    /// statement tree.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: SecretId::Named(name.into()),
        }
    }

    /// The secret's display name, if it was given one.
    pub fn name(&self) -> Option<&str> {
        match &self.id {
            SecretId::Named(name) => Some(name.as_str()),
            SecretId::Anonymous(_) => None,
        }
    }
}

impl Default for Secret {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for Secret {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            SecretId::Named(name) => write!(f, "Secret({name:?})"),
            SecretId::Anonymous(id) => write!(f, "Secret(#{id})"),
        }
    }
}

/// A value assignment for [`Secret`]s (the `secret_dict` of §3/§6.3),
/// populated for the lifetime of a single `Prover` session.
#[derive(Clone, Debug, Default)]
pub struct SecretMap<F> {
    values: HashMap<SecretId, F>,
}

impl<F: Copy> SecretMap<F> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Binds `secret` to `value`, consuming and returning `self` for chaining.
    pub fn with(mut self, secret: &Secret, value: F) -> Self {
        self.values.insert(secret.id.clone(), value);
        self
    }

    /// Binds `secret` to `value` in place.
    pub fn insert(&mut self, secret: &Secret, value: F) {
        self.values.insert(secret.id.clone(), value);
    }

    /// Looks up the value bound to `secret`, if any.
    pub fn get(&self, secret: &Secret) -> Option<F> {
        self.values.get(&secret.id).copied()
    }
}

impl<F: Copy> FromIterator<(Secret, F)> for SecretMap<F> {
    fn from_iter<T: IntoIterator<Item = (Secret, F)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (secret, value) in iter {
            map.insert(&secret, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_secrets_share_identity() {
        let a = Secret::named("x");
        let b = Secret::named("x");
        assert_eq!(a, b);
    }

    #[test]
    fn anonymous_secrets_are_distinct() {
        let a = Secret::new();
        let b = Secret::new();
        assert_ne!(a, b);
    }

    #[test]
    fn secret_map_round_trips() {
        let x = Secret::named("x");
        let y = Secret::new();
        let map = SecretMap::new().with(&x, 5u64).with(&y, 9u64);
        assert_eq!(map.get(&x), Some(5));
        assert_eq!(map.get(&y), Some(9));
        assert_eq!(map.get(&Secret::named("x")), Some(5));
    }
}
