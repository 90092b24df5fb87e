#![cfg(test)]

// Property tests for RedBlackTree: every step is checked against a BTreeMap
// model and the full invariant checker.

use crate::rb_tree::RedBlackTree;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16, u32),
    Remove(i16),
    RemoveByHandle(i16),
    Get(i16),
}

fn arb_op(span: i16) -> impl Strategy<Value = Op> {
    let key = -span..span;
    prop_oneof![
        5 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => key.clone().prop_map(Op::Remove),
        1 => key.clone().prop_map(Op::RemoveByHandle),
        2 => key.prop_map(Op::Get),
    ]
}

// Property: state-machine equivalence against std::collections::BTreeMap.
// Invariants exercised after every operation:
// - root black, no red-red edge, equal black height on every path;
// - parent/child links agree and in-order keys ascend;
// - height stays within 2 * log2(len + 1);
// - inserts return the previous value; removals of absent keys are no-ops.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn prop_tree_matches_model(ops in proptest::collection::vec(arb_op(64), 1..300)) {
        let mut sut: RedBlackTree<i16, u32> = RedBlackTree::new();
        let mut model: BTreeMap<i16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(sut.insert(k, v).unwrap(), model.insert(k, v));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k).unwrap(), model.remove(&k));
                }
                Op::RemoveByHandle(k) => {
                    let removed = sut.find(&k).unwrap().and_then(|h| sut.remove_node(h));
                    prop_assert_eq!(removed, model.remove(&k).map(|v| (k, v)));
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k).unwrap(), model.get(&k));
                }
            }

            let black_height = sut.validate();
            prop_assert!(black_height.is_ok(), "violation: {:?}", black_height);
            prop_assert_eq!(sut.len(), model.len());
            let bound = 2.0 * ((sut.len() + 1) as f64).log2();
            prop_assert!(sut.height() as f64 <= bound, "height {} > {}", sut.height(), bound);
        }

        let mut keys: Vec<i16> = sut.preorder().map(|n| *n.key()).collect();
        keys.sort();
        let expected: Vec<i16> = model.keys().copied().collect();
        prop_assert_eq!(keys, expected);
    }

    // Property: duplicate inserts never change the tree's shape.
    #[test]
    fn prop_duplicate_insert_is_shape_preserving(
        keys in proptest::collection::btree_set(any::<i32>(), 1..80),
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<i32> = keys.into_iter().collect();
        let mut t: RedBlackTree<i32, usize> = RedBlackTree::new();
        for (i, k) in keys.iter().enumerate() {
            t.insert(*k, i).unwrap();
        }
        let before: Vec<_> = t.preorder().map(|n| (*n.key(), n.color())).collect();
        let k = keys[pick.index(keys.len())];
        prop_assert!(t.insert(k, usize::MAX).unwrap().is_some());
        let after: Vec<_> = t.preorder().map(|n| (*n.key(), n.color())).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(t.get(&k).unwrap(), Some(&usize::MAX));
    }
}
