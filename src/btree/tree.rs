//! B-Tree implementation
//!
//! Owns the root node and tracks the record count.

use crate::error::{NavError, Result};

use super::iter::Iter;
use super::node::Node;
use super::{MAX_KEYS, MIN_KEYS};

/// Ordered `u64 → String` index
///
/// ## Invariants
/// - keys strictly ascending within every node
/// - every key in `children[i]` lies strictly between `keys[i-1]` and `keys[i]`
/// - internal nodes have `keys.len() + 1` children, leaves have none
/// - non-root nodes hold between `MIN_KEYS` and `MAX_KEYS` keys
/// - all leaves sit at the same depth
#[derive(Debug, Default, Clone)]
pub struct BTree {
    pub(super) root: Option<Node>,
    pub(super) len: usize,
}

impl BTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the value stored under `key`
    pub fn search(&self, key: u64) -> Option<&str> {
        self.root.as_ref()?.search(key)
    }

    pub fn exists(&self, key: u64) -> bool {
        self.search(key).is_some()
    }

    /// Insert a record, overwriting the value if the key is already present
    ///
    /// Returns `true` if a new record was added, `false` on overwrite.
    pub fn insert(&mut self, key: u64, value: impl Into<String>) -> bool {
        let value = value.into();

        if let Some(slot) = self.root.as_mut().and_then(|root| root.value_mut(key)) {
            *slot = value;
            return false;
        }

        match self.root.take() {
            None => {
                let mut leaf = Node::new(true);
                leaf.keys.push(key);
                leaf.values.push(value);
                self.root = Some(leaf);
            }
            Some(old_root) if old_root.is_full() => {
                // Grow by one level: the old root becomes the sole child of a
                // new root and is split before the insert descends.
                let mut new_root = Node::new(false);
                new_root.children.push(old_root);
                new_root.split_child(0);

                let idx = usize::from(key > new_root.keys[0]);
                new_root.children[idx].insert_non_full(key, value);
                self.root = Some(new_root);
            }
            Some(mut root) => {
                root.insert_non_full(key, value);
                self.root = Some(root);
            }
        }

        self.len += 1;
        true
    }

    /// Replace the value of an existing key
    ///
    /// Returns `false` (and changes nothing) when the key is absent.
    pub fn update(&mut self, key: u64, value: impl Into<String>) -> bool {
        match self.root.as_mut().and_then(|root| root.value_mut(key)) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// All records in ascending key order
    pub fn traverse_all(&self) -> Vec<(u64, String)> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(root) = &self.root {
            root.collect_into(&mut out);
        }
        out
    }

    /// Borrowing in-order iterator
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.root.as_ref())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest key, found by following rightmost children down to a leaf
    pub fn max_key(&self) -> Option<u64> {
        let mut node = self.root.as_ref()?;
        while !node.leaf {
            node = node.children.last()?;
        }
        node.keys.last().copied()
    }

    /// Smallest key
    pub fn min_key(&self) -> Option<u64> {
        let mut node = self.root.as_ref()?;
        while !node.leaf {
            node = node.children.first()?;
        }
        node.keys.first().copied()
    }

    /// Number of levels (0 for an empty tree, 1 for a lone leaf root)
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_ref();
        while let Some(current) = node {
            height += 1;
            node = current.children.first();
        }
        height
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, Node::node_count)
    }

    /// Release every node
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Check every structural invariant
    pub fn validate(&self) -> Result<()> {
        let Some(root) = &self.root else {
            if self.len != 0 {
                return Err(NavError::Snapshot(format!(
                    "empty tree reports {} records",
                    self.len
                )));
            }
            return Ok(());
        };

        let mut leaf_depth = None;
        validate_node(root, None, None, true, 1, &mut leaf_depth)?;

        let counted = root.count();
        if counted != self.len {
            return Err(NavError::Snapshot(format!(
                "tree holds {} records but reports {}",
                counted, self.len
            )));
        }
        Ok(())
    }

    /// Rebuild the cached record count from the nodes
    pub(super) fn recount(&mut self) {
        self.len = self.root.as_ref().map_or(0, Node::count);
    }
}

impl<'a> IntoIterator for &'a BTree {
    type Item = (u64, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate_node(
    node: &Node,
    lower: Option<u64>,
    upper: Option<u64>,
    is_root: bool,
    depth: usize,
    leaf_depth: &mut Option<usize>,
) -> Result<()> {
    let violation = |what: String| Err(NavError::Snapshot(what));

    if node.keys.len() != node.values.len() {
        return violation(format!(
            "node has {} keys but {} values",
            node.keys.len(),
            node.values.len()
        ));
    }
    if node.keys.len() > MAX_KEYS {
        return violation(format!("node has {} keys (max {})", node.keys.len(), MAX_KEYS));
    }
    if node.keys.is_empty() || (!is_root && node.keys.len() < MIN_KEYS) {
        return violation(format!("node has {} keys (min {})", node.keys.len(), MIN_KEYS));
    }
    if node.keys.windows(2).any(|pair| pair[0] >= pair[1]) {
        return violation(format!("node keys not strictly ascending: {:?}", node.keys));
    }
    if let (Some(low), Some(&first)) = (lower, node.keys.first()) {
        if first <= low {
            return violation(format!("key {} not above separator {}", first, low));
        }
    }
    if let (Some(high), Some(&last)) = (upper, node.keys.last()) {
        if last >= high {
            return violation(format!("key {} not below separator {}", last, high));
        }
    }

    if node.leaf {
        if !node.children.is_empty() {
            return violation("leaf node owns children".to_string());
        }
        match *leaf_depth {
            None => *leaf_depth = Some(depth),
            Some(expected) if expected != depth => {
                return violation(format!("leaf at depth {} (expected {})", depth, expected));
            }
            Some(_) => {}
        }
        return Ok(());
    }

    if node.children.len() != node.keys.len() + 1 {
        return violation(format!(
            "internal node has {} keys but {} children",
            node.keys.len(),
            node.children.len()
        ));
    }
    for (i, child) in node.children.iter().enumerate() {
        let low = if i == 0 { lower } else { Some(node.keys[i - 1]) };
        let high = node.keys.get(i).copied().or(upper);
        validate_node(child, low, high, false, depth + 1, leaf_depth)?;
    }
    Ok(())
}
