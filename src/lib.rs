//! chained-hashtable: a single-threaded, separately-chained hash table
//! with pluggable hashing and pair hooks.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a generic associative table that does not commit to one key or
//!   value type, with the growth policy fixed and easy to reason about.
//! - Layers:
//!   - Chain<K, V>: the ordered pairs of one bucket; prepend, scan,
//!     remove-at-cursor, drain.
//!   - RawTable<K, V>: the bucket array and entry count; placement by
//!     stored hash and whole-table doubling.
//!   - HashTable<K, V, S, H>: public API; hashes with `S: BuildHasher`,
//!     compares with `K: Eq`, and routes every stored pair through the
//!     `H: PairHooks` duplicate/free hooks.
//!
//! Growth policy
//! - Tables start with `INITIAL_BUCKETS` (1024) chains.
//! - When an insert would bring the entry count to
//!   `LOAD_FACTOR * bucket_count` (load factor 1), the bucket array doubles
//!   and every pair is re-placed at `hash % bucket_count` before the insert
//!   returns. Deletes never shrink the table.
//! - Growth builds the larger bucket array next to the current one, moves
//!   each pair across, and then replaces the old array. The old array is
//!   empty by then and is simply dropped.
//!
//! Hashing and equality
//! - Each pair stores the `u64` hash of its key, computed once on insert.
//!   Growth re-places pairs from the stored hash, so `K: Hash` is never
//!   invoked after insertion.
//! - Key equality is `K: Eq`; lookups accept any borrowed form `Q` with
//!   `K: Borrow<Q>`.
//!
//! Ownership and hooks
//! - Keys and values are moved into the table. `PairHooks::dup_key` and
//!   `dup_value` run once as a pair is stored; `free_pair` runs once as it
//!   leaves (delete, update, clear, drop). Growth moves pairs without
//!   calling either.
//!
//! Failure model
//! - Allocation failure of the bucket array, a growth replica, or a chain
//!   slot is reported as `TryReserveError` / `InsertError::OutOfMemory`,
//!   and no new pair is stored. A failing `update` has already released
//!   the old pair, so the key ends up absent.
//! - A missing key is not an error: `find` returns `None` and `delete`
//!   returns `false`.
//!
//! Constraints
//! - Single-threaded: no internal locking. Callers sharing a table must
//!   wrap every call, including the growth hidden inside insert, in one
//!   exclusive lock.
//! - Reentrancy from `Hash`, `Eq` or hook code back into the same table is
//!   caught by a debug-only guard.

mod chain;
pub mod hash_table;
mod hash_table_proptest;
pub mod hooks;
mod reentrancy;

// Public surface
pub use hash_table::{HashTable, InsertError, Iter, IterMut, INITIAL_BUCKETS, LOAD_FACTOR};
pub use hooks::{FnHooks, NoHooks, PairHooks};
