//! Pair hooks: how keys and values enter the table and how stored pairs
//! are released.
//!
//! A table owns exactly one hooks value, so duplication and destruction are
//! always configured together. `dup_key`/`dup_value` run once per stored
//! pair on its way in; `free_pair` runs once per stored pair on its way out
//! (delete, update, clear, or dropping the table). Growing the table moves
//! pairs and never calls either.

use core::fmt;

pub trait PairHooks<K, V> {
    /// Produce the key that will be stored. Defaults to storing `key` as-is.
    ///
    /// The result must compare equal to `key` and hash the same way; the
    /// table places the pair using the hash of the key it was given.
    #[inline]
    fn dup_key(&mut self, key: K) -> K {
        key
    }

    /// Produce the value that will be stored. Defaults to storing `value` as-is.
    #[inline]
    fn dup_value(&mut self, value: V) -> V {
        value
    }

    /// Release a pair that is leaving the table. Defaults to dropping the
    /// key, then the value.
    #[inline]
    fn free_pair(&mut self, key: K, value: V) {
        drop(key);
        drop(value);
    }
}

/// Store keys and values as given; drop them on release.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NoHooks;

impl<K, V> PairHooks<K, V> for NoHooks {}

type DupFn<T> = Box<dyn FnMut(T) -> T>;
type FreeFn<K, V> = Box<dyn FnMut(K, V)>;

/// Hooks assembled from closures. Any hook left unset falls back to the
/// `PairHooks` default.
///
/// ```
/// use chained_hashtable::{FnHooks, HashTable};
/// use hashbrown::hash_map::DefaultHashBuilder;
///
/// let hooks = FnHooks::new()
///     .value_dup(|v: String| v.trim().to_string())
///     .pair_free(|_k: String, _v: String| {});
/// let mut t = HashTable::with_hasher_and_hooks(DefaultHashBuilder::default(), hooks);
/// t.insert("k".to_string(), "  padded ".to_string()).unwrap();
/// assert_eq!(t.find("k").map(String::as_str), Some("padded"));
/// ```
pub struct FnHooks<K, V> {
    key_dup: Option<DupFn<K>>,
    value_dup: Option<DupFn<V>>,
    pair_free: Option<FreeFn<K, V>>,
}

impl<K, V> FnHooks<K, V> {
    pub fn new() -> Self {
        Self {
            key_dup: None,
            value_dup: None,
            pair_free: None,
        }
    }

    pub fn key_dup<F>(mut self, f: F) -> Self
    where
        F: FnMut(K) -> K + 'static,
    {
        self.key_dup = Some(Box::new(f));
        self
    }

    pub fn value_dup<F>(mut self, f: F) -> Self
    where
        F: FnMut(V) -> V + 'static,
    {
        self.value_dup = Some(Box::new(f));
        self
    }

    pub fn pair_free<F>(mut self, f: F) -> Self
    where
        F: FnMut(K, V) + 'static,
    {
        self.pair_free = Some(Box::new(f));
        self
    }
}

impl<K, V> Default for FnHooks<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PairHooks<K, V> for FnHooks<K, V> {
    fn dup_key(&mut self, key: K) -> K {
        match self.key_dup.as_mut() {
            Some(f) => f(key),
            None => key,
        }
    }

    fn dup_value(&mut self, value: V) -> V {
        match self.value_dup.as_mut() {
            Some(f) => f(value),
            None => value,
        }
    }

    fn free_pair(&mut self, key: K, value: V) {
        match self.pair_free.as_mut() {
            Some(f) => f(key, value),
            None => {
                drop(key);
                drop(value);
            }
        }
    }
}

impl<K, V> fmt::Debug for FnHooks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHooks")
            .field("key_dup", &self.key_dup.is_some())
            .field("value_dup", &self.value_dup.is_some())
            .field("pair_free", &self.pair_free.is_some())
            .finish()
    }
}
