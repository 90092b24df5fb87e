//! The mapping contract both structures satisfy, and the entry they store.

use crate::error::DictError;
use core::fmt;

/// A key/value pair together with the hash computed when it was stored.
///
/// The hash is never recomputed: chain splitting in the hash table and the
/// tree's diagnostics read it back as-is. Keys are immutable once stored.
#[derive(Debug, Clone)]
pub struct Entry<K, V> {
    hash: u32,
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(hash: u32, key: K, value: V) -> Self {
        Self { hash, key, value }
    }

    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Replace the value, returning the one it displaced.
    #[inline]
    pub fn set_value(&mut self, value: V) -> V {
        core::mem::replace(&mut self.value, value)
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

/// Entries are equal when both key and value are equal; the cached hash
/// does not take part.
impl<K: PartialEq, V: PartialEq> PartialEq for Entry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl<K: Eq, V: Eq> Eq for Entry<K, V> {}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.key, self.value)
    }
}

/// Key→value mapping with insert-or-update semantics.
///
/// `Ok(None)` means "not present"; errors are reserved for keys the
/// structure cannot handle at all.
pub trait Dictionary<K, V> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &K) -> Result<bool, DictError>;

    fn get(&self, key: &K) -> Result<Option<&V>, DictError>;

    /// Map `key` to `value`, returning the value previously mapped to it.
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, DictError>;

    /// Remove the mapping for `key`, returning its value if it existed.
    fn remove(&mut self, key: &K) -> Result<Option<V>, DictError>;
}
