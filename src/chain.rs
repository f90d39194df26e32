//! Chain: the ordered run of pairs stored in one bucket.
//!
//! The logical front of a chain is the tail of its backing `Vec`, so
//! `prepend` is an amortized O(1) push and iteration walks the vector in
//! reverse. Recently inserted pairs are therefore visited first.

use core::iter::Rev;
use core::slice;
use std::collections::TryReserveError;
use std::vec;

/// A stored key/value record. `hash` is computed once on insert and reused
/// whenever the pair has to be placed into a differently sized bucket array.
#[derive(Debug)]
pub(crate) struct Pair<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

#[derive(Debug)]
pub(crate) struct Chain<K, V> {
    pairs: Vec<Pair<K, V>>,
}

impl<K, V> Chain<K, V> {
    pub(crate) const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.pairs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Make room for `additional` more pairs without touching the contents.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.pairs.try_reserve(additional)
    }

    /// Put `pair` at the front of the chain.
    ///
    /// Callers reserve first when allocation failure must be reported.
    pub(crate) fn prepend(&mut self, pair: Pair<K, V>) {
        self.pairs.push(pair);
    }

    /// Front-to-back iteration.
    pub(crate) fn iter(&self) -> Rev<slice::Iter<'_, Pair<K, V>>> {
        self.pairs.iter().rev()
    }

    pub(crate) fn iter_mut(&mut self) -> Rev<slice::IterMut<'_, Pair<K, V>>> {
        self.pairs.iter_mut().rev()
    }

    /// Position of the first pair, front to back, that satisfies `pred`.
    ///
    /// The returned cursor is only valid until the chain is next mutated.
    pub(crate) fn position<F>(&self, mut pred: F) -> Option<Cursor>
    where
        F: FnMut(&Pair<K, V>) -> bool,
    {
        self.pairs.iter().rposition(|p| pred(p)).map(Cursor)
    }

    pub(crate) fn get(&self, at: Cursor) -> &Pair<K, V> {
        &self.pairs[at.0]
    }

    pub(crate) fn get_mut(&mut self, at: Cursor) -> &mut Pair<K, V> {
        &mut self.pairs[at.0]
    }

    /// Unlink the pair under `at`, keeping the order of the others.
    pub(crate) fn remove_at(&mut self, at: Cursor) -> Pair<K, V> {
        self.pairs.remove(at.0)
    }

    /// Unlink the frontmost pair.
    pub(crate) fn pop_front(&mut self) -> Option<Pair<K, V>> {
        self.pairs.pop()
    }

    /// Unlink every pair, front first.
    pub(crate) fn drain(&mut self) -> Rev<vec::Drain<'_, Pair<K, V>>> {
        self.pairs.drain(..).rev()
    }
}

impl<K, V> Default for Chain<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of a pair inside one chain, as returned by `Chain::position`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Cursor(usize);
