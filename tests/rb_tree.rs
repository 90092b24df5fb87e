// RedBlackTree integration suite.
//
// Invariants exercised: root black, no red-red edge and equal black
// height after every structural change; duplicate inserts leave the shape
// alone; removal by key or by handle keeps the tree valid.
mod common;

use common::init_test_logger;
use dictionaries::{Color, DictError, RedBlackTree, TreeViolation};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

// Test: invariants hold after every insertion for several insertion orders.
#[test]
fn invariants_hold_for_every_insert_order() {
    init_test_logger();
    let orders: Vec<Vec<u32>> = vec![
        (0..512).collect(),
        (0..512).rev().collect(),
        // Zig-zag: smallest, largest, next smallest, ...
        (0..256).flat_map(|i| [i, 511 - i]).collect(),
        lcg(42).take(512).map(|x| (x >> 40) as u32).collect(),
    ];
    for keys in orders {
        let mut t = RedBlackTree::new();
        for k in keys {
            t.insert(k, k.to_string()).unwrap();
            if let Err(v) = t.validate() {
                panic!("after inserting {k}: {v}");
            }
        }
    }
}

// Test: duplicate key updates the value without adding a node.
#[test]
fn duplicate_key_updates_value_only() {
    init_test_logger();
    let mut t = RedBlackTree::new();
    for k in ["m", "c", "x", "a", "e"] {
        t.insert(k.to_string(), k.len()).unwrap();
    }
    let before: Vec<(String, Color)> = t.preorder().map(|n| (n.key().clone(), n.color())).collect();
    assert_eq!(t.insert("e".to_string(), 99).unwrap(), Some(1));
    let after: Vec<(String, Color)> = t.preorder().map(|n| (n.key().clone(), n.color())).collect();
    assert_eq!(before, after);
    assert_eq!(t.len(), 5);
    assert_eq!(t.get("e").unwrap(), Some(&99));
}

// Test: removal by key and by handle keeps the tree valid until empty.
#[test]
fn interleaved_removal_keeps_tree_valid() {
    init_test_logger();
    let mut t = RedBlackTree::new();
    let keys: Vec<u16> = lcg(7).take(400).map(|x| (x >> 50) as u16).collect();
    for &k in &keys {
        t.insert(k, u32::from(k)).unwrap();
    }
    let mut live: Vec<u16> = keys.clone();
    live.sort_unstable();
    live.dedup();
    assert_eq!(t.len(), live.len());

    for (i, k) in live.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(t.remove(k).unwrap(), Some(u32::from(*k)));
        } else {
            let h = t.find(k).unwrap().expect("present");
            assert_eq!(t.remove_node(h), Some((*k, u32::from(*k))));
        }
        t.validate().unwrap();
        assert!(!t.contains_key(k).unwrap());
    }
    assert!(t.is_empty());
}

// Test: black height grows logarithmically.
#[test]
fn height_is_logarithmic() {
    init_test_logger();
    let mut t = RedBlackTree::new();
    for k in 0..(1u32 << 14) {
        t.insert(k, ()).unwrap();
    }
    let n = t.len() as f64;
    assert!((t.height() as f64) <= 2.0 * (n + 1.0).log2());
    let bh = t.validate().unwrap();
    assert!(bh >= 8, "black height {bh}");
}

// Test: NaN keys are refused without touching the tree.
#[test]
fn nan_key_is_refused() {
    init_test_logger();
    let mut t: RedBlackTree<f32, &str> = RedBlackTree::new();
    t.insert_hashed(0, 1.0, "one").unwrap();
    assert_eq!(t.insert_hashed(0, f32::NAN, "nan"), Err(DictError::IncomparableKey));
    assert_eq!(t.contains_key(&f32::NAN), Err(DictError::IncomparableKey));
    assert_eq!(t.len(), 1);
    assert_eq!(t.validate(), Ok(2));
}

// Test: violations render readable messages.
#[test]
fn violation_messages() {
    let v = TreeViolation::BlackHeight { left: 3, right: 2 };
    assert_eq!(v.to_string(), "black height differs between subtrees (3 vs 2)");
    assert_eq!(
        DictError::IncomparableKey.to_string(),
        "key cannot be ordered against the keys in this tree"
    );
}

// Test: pre-order dump of a small tree.
#[test]
fn preorder_dump() {
    init_test_logger();
    let mut t = RedBlackTree::new();
    for k in [10, 20, 30, 15, 25, 5] {
        t.insert(k, k / 5).unwrap();
    }
    let mut out = Vec::new();
    t.write_preorder(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("TreeNode<Black, "));
    for line in &lines {
        assert!(line.starts_with("TreeNode<"), "{line}");
    }
}
