#![cfg(test)]

// Property tests for ChainedHashTable kept inside the crate so they can use
// the identity hasher alongside the default one.

use crate::chained_hash_table::ChainedHashTable;
use crate::hashing::IdentityBuildHasher;
use crate::config::{TableConfig, MAXIMUM_CAPACITY};
use core::hash::BuildHasher;
use proptest::prelude::*;
use std::collections::HashMap;

// Keys drawn from a small range so chains collide and several resizes happen
// within one scenario.
#[derive(Clone, Debug)]
enum Op {
    Insert(i32, u16),
    Remove(i32),
    Get(i32),
    Update(i32, u16),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let key = -8i32..120;
    prop_oneof![
        4 => (key.clone(), any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Get),
        1 => (key, any::<u16>()).prop_map(|(k, v)| Op::Update(k, v)),
    ]
}

fn arb_config() -> impl Strategy<Value = TableConfig> {
    let load_factor = prop_oneof![
        Just(0.75f32),
        Just(0.5),
        Just(1.0),
        Just(2.0),
        Just(0.1),
        Just(0.01),
    ];
    (0usize..40, load_factor)
        .prop_map(|(cap, lf)| TableConfig::with_capacity(cap).load_factor(lf))
}

fn run_against_model<S: BuildHasher>(
    mut sut: ChainedHashTable<i32, u16, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<i32, u16> = HashMap::new();
    let mut last_capacity = 0;

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                prop_assert!(!sut.contains_key(&k));
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            Op::Update(k, v) => {
                if let Some(slot) = sut.get_mut(&k) {
                    *slot = v;
                }
                if let Some(slot) = model.get_mut(&k) {
                    *slot = v;
                }
            }
        }

        // Geometry after every step.
        let cap = sut.capacity();
        prop_assert!(cap == 0 || cap.is_power_of_two());
        prop_assert!(cap >= last_capacity, "capacity never shrinks");
        prop_assert!(sut.len() <= sut.threshold());
        if cap > 0 && cap < MAXIMUM_CAPACITY {
            let floor = (cap as f32 * sut.load_factor()) as usize;
            prop_assert_eq!(sut.threshold(), floor);
        }
        prop_assert_eq!(sut.len(), model.len());
        let chained: usize = (0..cap).map(|i| sut.bucket_len(i)).sum();
        prop_assert_eq!(chained, sut.len());
        last_capacity = cap;
    }

    // Everything the model holds survives every resize.
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert returns the previous value and leaves len unchanged on update;
// - remove of an absent key is a no-op returning None;
// - capacity is zero or a power of two, never shrinks, and len <= threshold;
// - once allocated, threshold == floor(capacity * load_factor);
// - the chains hold exactly len() entries and every key stays reachable
//   across resizes.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn prop_identity_hasher_matches_model(
        config in arb_config(),
        ops in proptest::collection::vec(arb_op(), 1..200),
    ) {
        let sut = ChainedHashTable::with_config_and_hasher(config, IdentityBuildHasher).unwrap();
        run_against_model(sut, ops)?;
    }

    #[test]
    fn prop_default_hasher_matches_model(
        config in arb_config(),
        ops in proptest::collection::vec(arb_op(), 1..200),
    ) {
        let sut = ChainedHashTable::with_config(config).unwrap();
        run_against_model(sut, ops)?;
    }

    // Property: requested capacity rounds up to the next power of two on
    // first allocation.
    #[test]
    fn prop_first_allocation_rounds_up(requested in 2usize..5000) {
        let mut t: ChainedHashTable<i32, ()> = ChainedHashTable::with_capacity(requested);
        prop_assert_eq!(t.capacity(), 0);
        t.insert(1, ());
        prop_assert_eq!(t.capacity(), requested.next_power_of_two());
    }
}
