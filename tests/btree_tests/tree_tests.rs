//! Tree Tests
//!
//! These tests verify:
//! - Ordered traversal after arbitrary insertion orders
//! - Overwrite and update semantics
//! - Split behavior at the node capacity
//! - Structural invariants

use navdb::btree::{BTree, MAX_KEYS};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn tree_with(keys: &[u64]) -> BTree {
    let mut tree = BTree::new();
    for &k in keys {
        tree.insert(k, format!("v{}", k));
    }
    tree
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_empty_tree() {
    let tree = BTree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.max_key(), None);
    assert_eq!(tree.search(1), None);
    assert!(tree.traverse_all().is_empty());
    tree.validate().unwrap();
}

#[test]
fn test_insert_and_search() {
    let tree = tree_with(&[42, 7, 19]);

    assert_eq!(tree.search(7), Some("v7"));
    assert_eq!(tree.search(19), Some("v19"));
    assert_eq!(tree.search(42), Some("v42"));
    assert_eq!(tree.search(8), None);
    assert!(tree.exists(42));
    assert!(!tree.exists(43));
}

#[test]
fn test_insert_existing_key_overwrites() {
    let mut tree = BTree::new();
    assert!(tree.insert(5, "first"));
    assert!(!tree.insert(5, "second"));

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.search(5), Some("second"));
}

#[test]
fn test_update_existing_key() {
    let mut tree = tree_with(&[1, 2, 3]);

    assert!(tree.update(2, "changed"));
    assert_eq!(tree.search(2), Some("changed"));
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_update_missing_key_is_noop() {
    let mut tree = tree_with(&[1, 2, 3]);

    assert!(!tree.update(9, "nope"));
    assert_eq!(tree.search(9), None);
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_empty_value_is_stored() {
    let mut tree = BTree::new();
    tree.insert(1, "");
    assert_eq!(tree.search(1), Some(""));
}

// =============================================================================
// Split Tests
// =============================================================================

#[test]
fn test_full_leaf_root_splits_on_next_insert() {
    let mut tree = tree_with(&[10, 20, 5, 6, 12]);
    assert_eq!(tree.len(), MAX_KEYS);
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.node_count(), 1);

    tree.insert(30, "v30");
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.node_count(), 3);
    tree.validate().unwrap();

    let keys: Vec<u64> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![5, 6, 10, 12, 20, 30]);
}

#[test]
fn test_inserts_below_capacity_do_not_grow_height() {
    let mut tree = tree_with(&[10, 20, 5, 6, 12, 30]);

    tree.insert(7, "v7");
    tree.insert(17, "v17");

    assert_eq!(tree.height(), 2);
    assert_eq!(tree.node_count(), 3);
    assert_eq!(tree.len(), 8);
    tree.validate().unwrap();
}

#[test]
fn test_sequential_inserts_keep_invariants() {
    let mut tree = BTree::new();
    for k in 1..=500u64 {
        tree.insert(k, k.to_string());
        if k % 50 == 0 {
            tree.validate().unwrap();
        }
    }

    assert_eq!(tree.len(), 500);
    assert_eq!(tree.min_key(), Some(1));
    assert_eq!(tree.max_key(), Some(500));
    assert!(tree.height() >= 3);
}

#[test]
fn test_descending_inserts_keep_invariants() {
    let mut tree = BTree::new();
    for k in (1..=300u64).rev() {
        tree.insert(k, "x");
    }

    tree.validate().unwrap();
    let keys: Vec<u64> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, (1..=300).collect::<Vec<_>>());
}

#[test]
fn test_max_key_follows_rightmost_path() {
    let tree = tree_with(&[3, 99, 14, 56, 2, 71, 8, 40, 61, 90, 15]);
    assert_eq!(tree.max_key(), Some(99));
    assert_eq!(tree.min_key(), Some(2));
}

#[test]
fn test_clear_releases_everything() {
    let mut tree = tree_with(&[1, 2, 3, 4, 5, 6, 7]);
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.search(4), None);
}

#[test]
fn test_traverse_all_matches_iter() {
    let tree = tree_with(&[9, 1, 8, 2, 7, 3, 6, 4, 5]);

    let owned = tree.traverse_all();
    let borrowed: Vec<(u64, String)> = tree.iter().map(|(k, v)| (k, v.to_string())).collect();
    assert_eq!(owned, borrowed);

    let via_ref: Vec<u64> = (&tree).into_iter().map(|(k, _)| k).collect();
    assert_eq!(via_ref, (1..=9).collect::<Vec<_>>());
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_traversal_is_sorted_and_deduplicated(keys in prop::collection::vec(0u64..1_000, 0..200)) {
        let tree = tree_with(&keys);

        let mut expected = keys.clone();
        expected.sort_unstable();
        expected.dedup();

        let traversed: Vec<u64> = tree.iter().map(|(k, _)| k).collect();
        prop_assert_eq!(&traversed, &expected);
        prop_assert_eq!(tree.len(), expected.len());
        prop_assert!(tree.validate().is_ok());
    }

    #[test]
    fn prop_every_inserted_key_is_found(keys in prop::collection::vec(any::<u64>(), 1..150)) {
        let tree = tree_with(&keys);
        for k in &keys {
            let expected = format!("v{}", k);
            prop_assert_eq!(tree.search(*k), Some(expected.as_str()));
        }
        prop_assert_eq!(tree.max_key(), keys.iter().copied().max());
    }
}
