//! HashTable: separately-chained buckets that double when full.

use crate::chain::{Chain, Cursor, Pair};
use crate::hooks::{NoHooks, PairHooks};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::Rev;
use core::slice;
use hashbrown::hash_map::DefaultHashBuilder;
use std::collections::TryReserveError;

/// Number of buckets in a freshly constructed table.
pub const INITIAL_BUCKETS: usize = 1024;

/// Entries per bucket at which the table doubles.
pub const LOAD_FACTOR: usize = 1;

/// Why `insert` or `update` did not store a pair.
#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    /// An equal key is already stored; the table was left unchanged.
    #[error("key already present in table")]
    DuplicateKey,
    /// Growing the bucket array or a chain failed; no new pair was stored.
    #[error("hash table allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

#[inline]
fn bucket_index(hash: u64, bucket_count: usize) -> usize {
    (hash % bucket_count as u64) as usize
}

/// Bucket storage without hashing or hooks. Growth builds a second
/// `RawTable` and moves it into place.
struct RawTable<K, V> {
    buckets: Vec<Chain<K, V>>,
    len: usize,
}

impl<K, V> RawTable<K, V> {
    fn with_buckets(count: usize) -> Self {
        Self {
            buckets: (0..count).map(|_| Chain::new()).collect(),
            len: 0,
        }
    }

    fn try_with_buckets(count: usize) -> Result<Self, TryReserveError> {
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(count)?;
        buckets.resize_with(count, Chain::new);
        Ok(Self { buckets, len: 0 })
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<(usize, Cursor)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let b = bucket_index(hash, self.bucket_count());
        self.buckets[b]
            .position(|p| p.hash == hash && p.key.borrow() == q)
            .map(|at| (b, at))
    }

    fn pair(&self, b: usize, at: Cursor) -> &Pair<K, V> {
        self.buckets[b].get(at)
    }

    fn pair_mut(&mut self, b: usize, at: Cursor) -> &mut Pair<K, V> {
        self.buckets[b].get_mut(at)
    }

    /// Prepend `pair` to the chain its hash selects. The chain must already
    /// have room when allocation failure has to be reported.
    fn link(&mut self, pair: Pair<K, V>) {
        let b = bucket_index(pair.hash, self.bucket_count());
        self.buckets[b].prepend(pair);
        self.len += 1;
    }

    fn unlink(&mut self, b: usize, at: Cursor) -> Pair<K, V> {
        let pair = self.buckets[b].remove_at(at);
        self.len -= 1;
        pair
    }

    fn would_overload(&self, additional: usize) -> bool {
        self.len + additional >= LOAD_FACTOR.saturating_mul(self.bucket_count())
    }

    /// Shared insert path for a key known to be absent.
    ///
    /// Every allocation happens before the table is touched, so an error
    /// leaves it exactly as it was. Growing first and then placing the pair
    /// gives the same layout as placing it and then growing.
    fn insert_absent<H>(
        &mut self,
        hooks: &mut H,
        hash: u64,
        key: K,
        value: V,
    ) -> Result<(), TryReserveError>
    where
        H: PairHooks<K, V>,
    {
        if self.would_overload(1) {
            self.try_grow()?;
        }
        let b = bucket_index(hash, self.bucket_count());
        self.buckets[b].try_reserve(1)?;
        let key = hooks.dup_key(key);
        let value = hooks.dup_value(value);
        self.link(Pair { key, value, hash });
        Ok(())
    }

    /// Double the bucket count and re-place every pair under the new modulus.
    fn try_grow(&mut self) -> Result<(), TryReserveError> {
        self.try_resize(self.bucket_count().saturating_mul(2))
    }

    /// Re-place every pair into `new_count` buckets. On error nothing moved.
    fn try_resize(&mut self, new_count: usize) -> Result<(), TryReserveError> {
        let old_count = self.bucket_count();
        let grown = match self.try_alloc_resized(new_count) {
            Ok(grown) => grown,
            Err(e) => {
                #[cfg(feature = "logging")]
                log::warn!("hash table resize from {old_count} to {new_count} buckets failed: {e}");
                return Err(e);
            }
        };

        let old = core::mem::replace(self, grown);
        for mut chain in old.buckets {
            // Oldest first, so the newest pair stays at the front.
            for pair in chain.drain().rev() {
                self.link(pair);
            }
        }

        #[cfg(feature = "logging")]
        log::debug!(
            "hash table grew from {old_count} to {new_count} buckets ({} entries)",
            self.len
        );
        Ok(())
    }

    /// An empty table of `new_count` buckets whose chains already have
    /// room for the pairs they will receive, so the moves never allocate.
    fn try_alloc_resized(&self, new_count: usize) -> Result<Self, TryReserveError> {
        let mut grown = Self::try_with_buckets(new_count)?;
        let mut sizes: Vec<usize> = Vec::new();
        sizes.try_reserve_exact(new_count)?;
        sizes.resize(new_count, 0);
        for pair in self.buckets.iter().flat_map(Chain::iter) {
            sizes[bucket_index(pair.hash, new_count)] += 1;
        }
        for (chain, &n) in grown.buckets.iter_mut().zip(&sizes) {
            if n > 0 {
                chain.try_reserve(n)?;
            }
        }
        Ok(grown)
    }

    /// Release pairs one at a time. `len` is decremented before each hook
    /// runs, so a panicking hook leaves the count matching the chains.
    fn release_all<H>(&mut self, hooks: &mut H)
    where
        H: PairHooks<K, V>,
    {
        for chain in self.buckets.iter_mut() {
            while let Some(pair) = chain.pop_front() {
                self.len -= 1;
                hooks.free_pair(pair.key, pair.value);
            }
        }
    }
}

/// A generic hash table with separate chaining.
///
/// Keys are hashed with `S` and compared with `Eq`. Pairs are kept in
/// `bucket_count` chains; a pair whose key hashes to `h` lives in chain
/// `h % bucket_count`. The table starts with [`INITIAL_BUCKETS`] chains and
/// doubles as soon as the number of entries reaches
/// `LOAD_FACTOR * bucket_count`. It never shrinks.
///
/// `H` decides how keys and values are stored and released; see
/// [`PairHooks`].
pub struct HashTable<K, V, S = DefaultHashBuilder, H: PairHooks<K, V> = NoHooks> {
    raw: RawTable<K, V>,
    hasher: S,
    hooks: H,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashTable<K, V>
where
    K: Eq + Hash,
{
    /// Empty table with the default hasher and no hooks.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Like `new`, but reports allocation failure of the bucket array.
    pub fn try_new() -> Result<Self, TryReserveError> {
        Self::try_with_hasher(Default::default())
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Empty table hashing with `hasher`, with no hooks.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_hooks(hasher, NoHooks)
    }

    /// Like `with_hasher`, but reports allocation failure of the bucket array.
    pub fn try_with_hasher(hasher: S) -> Result<Self, TryReserveError> {
        Self::try_with_hasher_and_hooks(hasher, NoHooks)
    }
}

impl<K, V, S, H> Default for HashTable<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    H: PairHooks<K, V> + Default,
{
    fn default() -> Self {
        Self::with_hasher_and_hooks(S::default(), H::default())
    }
}

impl<K, V, S, H> HashTable<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: PairHooks<K, V>,
{
    /// Build an empty table. Aborts on allocation failure, like `Vec`.
    pub fn with_hasher_and_hooks(hasher: S, hooks: H) -> Self {
        Self::from_raw(RawTable::with_buckets(INITIAL_BUCKETS), hasher, hooks)
    }

    /// Build an empty table, reporting allocation failure instead of aborting.
    pub fn try_with_hasher_and_hooks(hasher: S, hooks: H) -> Result<Self, TryReserveError> {
        match RawTable::try_with_buckets(INITIAL_BUCKETS) {
            Ok(raw) => Ok(Self::from_raw(raw, hasher, hooks)),
            Err(e) => {
                #[cfg(feature = "logging")]
                log::debug!("hash table construction failed: {e}");
                Err(e)
            }
        }
    }

    fn from_raw(raw: RawTable<K, V>, hasher: S, hooks: H) -> Self {
        Self {
            raw,
            hasher,
            hooks,
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.raw.len
    }

    /// `true` if no pairs are stored.
    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    /// Current number of chains; `INITIAL_BUCKETS` times a power of two.
    pub fn bucket_count(&self) -> usize {
        self.raw.bucket_count()
    }

    /// Entries per bucket at which the table doubles.
    pub fn load_factor(&self) -> usize {
        LOAD_FACTOR
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Insert `key -> value` only if no equal key is stored.
    ///
    /// On `Err(DuplicateKey)` the stored value is untouched and the rejected
    /// key and value are dropped without reaching the hooks.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        if self.raw.locate(hash, &key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.raw.insert_absent(&mut self.hooks, hash, key, value)?;
        Ok(())
    }

    /// Insert `key -> value`, first releasing any pair stored under an
    /// equal key. Never fails with `DuplicateKey`.
    ///
    /// The old pair goes through `free_pair` before the new one is
    /// duplicated. If allocation then fails, the key is left absent.
    pub fn update(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        if let Some((b, at)) = self.raw.locate(hash, &key) {
            let old = self.raw.unlink(b, at);
            self.hooks.free_pair(old.key, old.value);
        }
        self.raw.insert_absent(&mut self.hooks, hash, key, value)?;
        Ok(())
    }

    /// Value stored under `q`, if any.
    pub fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_key_value(q).map(|(_, v)| v)
    }

    /// Stored key and value for `q`, if any.
    pub fn find_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        let (b, at) = self.raw.locate(hash, q)?;
        let pair = self.raw.pair(b, at);
        Some((&pair.key, &pair.value))
    }

    /// Mutable access to the value stored under `q`, if any.
    pub fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        let (b, at) = self.raw.locate(hash, q)?;
        Some(&mut self.raw.pair_mut(b, at).value)
    }

    /// `true` if a key equal to `q` is stored.
    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        self.raw.locate(hash, q).is_some()
    }

    /// Release the pair stored under `q`, if any. Returns whether one was found.
    pub fn delete<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        match self.raw.locate(hash, q) {
            Some((b, at)) => {
                let pair = self.raw.unlink(b, at);
                self.hooks.free_pair(pair.key, pair.value);
                true
            }
            None => false,
        }
    }

    /// Release every pair. The bucket count is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.release_all(&mut self.hooks);
    }

    /// Release every pair and the table itself.
    pub fn destroy(self) {
        drop(self);
    }

    /// Visit every pair, in no particular order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.raw.buckets.iter(),
            chain: None,
            remaining: self.raw.len,
        }
    }

    /// Visit every pair with mutable access to the value, in no particular order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            remaining: self.raw.len,
            buckets: self.raw.buckets.iter_mut(),
            chain: None,
        }
    }

    /// Check the placement invariants: every pair sits in bucket
    /// `hash % bucket_count` with its stored hash matching its key, and
    /// `len` equals the number of pairs.
    #[cfg(test)]
    pub(crate) fn assert_placement(&self) {
        let count = self.bucket_count();
        let mut seen = 0;
        for (i, chain) in self.raw.buckets.iter().enumerate() {
            for pair in chain.iter() {
                assert_eq!(pair.hash, self.make_hash(&pair.key), "stale stored hash");
                assert_eq!(bucket_index(pair.hash, count), i, "pair in wrong bucket");
                seen += 1;
            }
        }
        assert_eq!(seen, self.raw.len, "len out of sync with chains");
        assert!(self.raw.len < LOAD_FACTOR * count, "table overloaded");
    }
}

impl<K, V, S, H> Drop for HashTable<K, V, S, H>
where
    H: PairHooks<K, V>,
{
    fn drop(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.release_all(&mut self.hooks);
    }
}

impl<K, V, S, H> fmt::Debug for HashTable<K, V, S, H>
where
    K: fmt::Debug,
    V: fmt::Debug,
    H: PairHooks<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = Iter {
            buckets: self.raw.buckets.iter(),
            chain: None,
            remaining: self.raw.len,
        };
        f.debug_map().entries(entries).finish()
    }
}

/// Iterator over the pairs of a `HashTable`.
pub struct Iter<'a, K, V> {
    buckets: slice::Iter<'a, Chain<K, V>>,
    chain: Option<Rev<slice::Iter<'a, Pair<K, V>>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.chain.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some((&pair.key, &pair.value));
            }
            self.chain = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the pairs of a `HashTable`, with mutable values.
pub struct IterMut<'a, K, V> {
    buckets: slice::IterMut<'a, Chain<K, V>>,
    chain: Option<Rev<slice::IterMut<'a, Pair<K, V>>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.chain.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some((&pair.key, &mut pair.value));
            }
            self.chain = Some(self.buckets.next()?.iter_mut());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<'a, K, V, S, H> IntoIterator for &'a HashTable<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: PairHooks<K, V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
