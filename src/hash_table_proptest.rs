#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check the
// bucket placement invariants directly.

use crate::hash_table::{HashTable, InsertError, INITIAL_BUCKETS};
use crate::hooks::PairHooks;
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations: indices shrink to earlier keys, the pool shrinks,
// and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Update(usize, i32),
    Delete(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Update(i, v)),
            2 => idx.clone().prop_map(Op::Delete),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Hooks that count stored and released pairs so leaks and double frees show up.
#[derive(Default)]
struct Balance {
    stored: usize,
    freed: usize,
}

impl PairHooks<String, i32> for Balance {
    fn dup_key(&mut self, key: String) -> String {
        self.stored += 1;
        key
    }
    fn free_pair(&mut self, _key: String, _value: i32) {
        self.freed += 1;
    }
}

fn run_against_model<S>(
    mut sut: HashTable<String, i32, S, Balance>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                    Err(e) => prop_assert!(false, "unexpected error: {}", e),
                }
            }
            Op::Update(i, v) => {
                let k = pool[i].clone();
                let res = sut.update(k.clone(), v);
                prop_assert!(res.is_ok());
                model.insert(k, v);
            }
            Op::Delete(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.delete(k.as_str()), model.remove(k).is_some());
            }
            Op::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k.as_str()), model.get(k));
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            Op::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.find_mut(k.as_str()), model.get_mut(k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "find_mut presence differs from model"),
                }
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.hooks().stored - sut.hooks().freed, model.len());
        sut.assert_placement();
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` rejects present keys; `update` is last-write-wins.
// - `find`/`contains_key`/`delete` agree with the model.
// - Every stored pair is released exactly once (stored - freed == len).
// - Every pair sits in bucket `hash % bucket_count`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut = HashTable::with_hasher_and_hooks(DefaultHashBuilder::default(), Balance::default());
        run_against_model(sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, with every key in one
// chain. This stresses scanning and remove-at-cursor.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = HashTable::with_hasher_and_hooks(ConstBuildHasher, Balance::default());
        run_against_model(sut, pool, ops)?;
    }
}

// Property: growth keeps every mapping. Enough unique keys are inserted,
// interleaved with deletes, that the live count always crosses one doubling.
proptest! {
    #![proptest_config(ProptestConfig { cases: 16, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_preserves_mappings(
        keys in proptest::collection::hash_set(any::<u64>(), 1600..2000),
        delete_every in 3usize..10,
    ) {
        let mut sut: HashTable<u64, u64> = HashTable::new();
        let mut model: HashMap<u64, u64> = HashMap::new();
        for (n, k) in keys.iter().copied().enumerate() {
            prop_assert!(sut.insert(k, k.wrapping_mul(3)).is_ok());
            model.insert(k, k.wrapping_mul(3));
            if n % delete_every == 0 {
                prop_assert!(sut.delete(&k));
                model.remove(&k);
            }
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.bucket_count() > INITIAL_BUCKETS);
        prop_assert!(sut.len() < sut.load_factor() * sut.bucket_count());
        for (k, v) in &model {
            prop_assert_eq!(sut.find(k), Some(v));
        }
        sut.assert_placement();
    }
}
