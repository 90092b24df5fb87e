// The Dictionary contract, checked identically against both structures.
mod common;

use common::init_test_logger;
use dictionaries::{ChainedHashTable, Dictionary, IdentityBuildHasher, RedBlackTree};

fn exercise<D: Dictionary<i64, String>>(mut d: D) {
    assert!(d.is_empty());
    assert_eq!(d.get(&1).unwrap(), None);
    assert_eq!(d.remove(&1).unwrap(), None);

    // N unique inserts -> size N.
    for k in 0..100i64 {
        assert_eq!(d.insert(k * 3, format!("v{k}")).unwrap(), None);
    }
    assert_eq!(d.len(), 100);

    // Duplicate: size unchanged, previous value returned.
    assert_eq!(
        d.insert(30, "again".to_string()).unwrap(),
        Some("v10".to_string())
    );
    assert_eq!(d.len(), 100);
    assert_eq!(d.get(&30).unwrap().map(String::as_str), Some("again"));

    // Present vs absent.
    assert!(d.contains_key(&297).unwrap());
    assert!(!d.contains_key(&298).unwrap());

    // Removal drops size by exactly one; absent removal is a no-op.
    assert_eq!(d.remove(&0).unwrap(), Some("v0".to_string()));
    assert_eq!(d.len(), 99);
    assert_eq!(d.remove(&0).unwrap(), None);
    assert_eq!(d.len(), 99);
    assert!(!d.contains_key(&0).unwrap());

    // Negative keys are ordinary keys.
    assert_eq!(d.insert(-5, "neg".to_string()).unwrap(), None);
    assert_eq!(d.get(&-5).unwrap().map(String::as_str), Some("neg"));
    assert_eq!(d.len(), 100);
}

#[test]
fn chained_hash_table_satisfies_contract() {
    init_test_logger();
    exercise(ChainedHashTable::new());
    exercise(ChainedHashTable::with_hasher(IdentityBuildHasher));
    exercise(ChainedHashTable::with_capacity_and_load_factor(1, 3.0).unwrap());
}

#[test]
fn red_black_tree_satisfies_contract() {
    init_test_logger();
    exercise(RedBlackTree::new());
    exercise(RedBlackTree::with_hasher(IdentityBuildHasher));
}
