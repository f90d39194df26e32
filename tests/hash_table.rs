use chained_hashtable::{FnHooks, HashTable, InsertError, PairHooks, INITIAL_BUCKETS, LOAD_FACTOR};
use hashbrown::hash_map::DefaultHashBuilder;
use std::cell::RefCell;
use std::rc::Rc;

/// Hooks for C-style strings: keys and values are copied on the way in and
/// every released pair is logged.
#[derive(Default)]
struct StrDup {
    copies: usize,
    released: Rc<RefCell<Vec<(String, String)>>>,
}

impl PairHooks<String, String> for StrDup {
    fn dup_key(&mut self, key: String) -> String {
        self.copies += 1;
        key.as_str().to_owned()
    }
    fn dup_value(&mut self, value: String) -> String {
        self.copies += 1;
        value.as_str().to_owned()
    }
    fn free_pair(&mut self, key: String, value: String) {
        self.released.borrow_mut().push((key, value));
    }
}

fn string_table() -> HashTable<String, String, DefaultHashBuilder, StrDup> {
    HashTable::with_hasher_and_hooks(DefaultHashBuilder::default(), StrDup::default())
}

#[test]
fn string_scenario_find_present_and_absent() {
    let mut t = string_table();
    for (k, v) in [("a", "A"), ("b", "B"), ("c", "C")] {
        t.insert(k.to_string(), v.to_string()).unwrap();
    }
    assert_eq!(t.find("a").map(String::as_str), Some("A"));
    assert_eq!(t.find("b").map(String::as_str), Some("B"));
    assert_eq!(t.find("c").map(String::as_str), Some("C"));
    assert!(t.find("z").is_none());
    assert_eq!(t.hooks().copies, 6);
}

#[test]
fn string_scenario_update_is_last_write_wins() {
    let mut t = string_table();
    let released = t.hooks().released.clone();
    t.update("a".to_string(), "A".to_string()).unwrap();
    t.update("a".to_string(), "Z".to_string()).unwrap();

    assert_eq!(t.find("a").map(String::as_str), Some("Z"));
    assert_eq!(t.len(), 1);
    assert_eq!(t.iter().filter(|(k, _)| k.as_str() == "a").count(), 1);
    assert_eq!(
        *released.borrow(),
        vec![("a".to_string(), "A".to_string())],
        "old pair released by update"
    );
}

#[test]
fn insert_on_existing_key_keeps_prior_value() {
    let mut t = string_table();
    t.insert("k".to_string(), "first".to_string()).unwrap();
    let err = t.insert("k".to_string(), "second".to_string()).unwrap_err();
    assert!(matches!(err, InsertError::DuplicateKey));
    assert_eq!(t.find("k").map(String::as_str), Some("first"));
    assert_eq!(t.len(), 1);
}

#[test]
fn delete_removes_and_absent_delete_is_noop() {
    let mut t = string_table();
    let released = t.hooks().released.clone();
    t.insert("a".to_string(), "A".to_string()).unwrap();
    t.insert("b".to_string(), "B".to_string()).unwrap();

    assert!(t.delete("a"));
    assert!(t.find("a").is_none());
    assert_eq!(released.borrow().len(), 1);

    assert!(!t.delete("nope"));
    assert_eq!(t.len(), 1);
    assert_eq!(released.borrow().len(), 1);
    assert_eq!(t.find("b").map(String::as_str), Some("B"));
}

#[test]
fn two_thousand_integer_keys_grow_and_stay_findable() {
    let mut t: HashTable<u64, u64> = HashTable::new();
    assert_eq!(t.bucket_count(), INITIAL_BUCKETS);
    for k in 0..2000u64 {
        t.insert(k, k * 10).unwrap();
    }
    assert_eq!(t.len(), 2000);
    assert!(t.bucket_count() >= 2 * INITIAL_BUCKETS);
    assert!(t.len() < LOAD_FACTOR * t.bucket_count());
    for k in 0..2000u64 {
        assert_eq!(t.find(&k), Some(&(k * 10)));
    }
}

#[test]
fn bucket_count_is_smallest_doubling_above_len() {
    let mut t: HashTable<u32, ()> = HashTable::new();
    for k in 0..10_000u32 {
        t.update(k, ()).unwrap();
        let n = t.len();
        let count = t.bucket_count();
        assert_eq!(count % INITIAL_BUCKETS, 0);
        assert!((count / INITIAL_BUCKETS).is_power_of_two());
        assert!(n < count);
        assert!(count == INITIAL_BUCKETS || n >= count / 2);
    }
}

#[test]
fn growth_preserves_find_results_across_resize() {
    let mut t: HashTable<String, usize> = HashTable::new();
    for i in 0..INITIAL_BUCKETS - 1 {
        t.insert(format!("key-{i}"), i).unwrap();
    }
    let before: Vec<Option<usize>> = (0..INITIAL_BUCKETS + 5)
        .map(|i| t.find(format!("key-{i}").as_str()).copied())
        .collect();

    t.insert("trigger".to_string(), usize::MAX).unwrap();
    assert_eq!(t.bucket_count(), 2 * INITIAL_BUCKETS);

    let after: Vec<Option<usize>> = (0..INITIAL_BUCKETS + 5)
        .map(|i| t.find(format!("key-{i}").as_str()).copied())
        .collect();
    assert_eq!(before, after);
    assert_eq!(t.find("trigger"), Some(&usize::MAX));
}

#[test]
fn dropping_table_releases_every_pair_once() {
    let released = Rc::new(RefCell::new(Vec::new()));
    {
        let log = released.clone();
        let hooks = FnHooks::new().pair_free(move |k: u32, v: u32| log.borrow_mut().push((k, v)));
        let mut t = HashTable::with_hasher_and_hooks(DefaultHashBuilder::default(), hooks);
        for k in 0..1500u32 {
            t.insert(k, k + 1).unwrap();
        }
        t.delete(&7);
    }
    let mut got = released.borrow().clone();
    got.sort_unstable();
    let expected: Vec<(u32, u32)> = (0..1500u32).map(|k| (k, k + 1)).collect();
    assert_eq!(got, expected);
}

#[test]
fn default_hooks_store_raw_values() {
    let shared = Rc::new(5);
    let mut t: HashTable<&'static str, Rc<i32>> = HashTable::new();
    t.insert("x", shared.clone()).unwrap();
    assert!(Rc::ptr_eq(t.find("x").unwrap(), &shared));
    assert_eq!(Rc::strong_count(&shared), 2);
    t.destroy();
    assert_eq!(Rc::strong_count(&shared), 1);
}

#[test]
fn try_new_builds_empty_table() {
    let t: HashTable<String, i32> = HashTable::try_new().expect("bucket array fits");
    assert!(t.is_empty());
    assert_eq!(t.bucket_count(), INITIAL_BUCKETS);
}
