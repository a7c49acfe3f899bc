//! B-Tree node
//!
//! A node owns its children directly; dropping the root releases the whole tree.

use super::{MAX_KEYS, ORDER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) leaf: bool,
    /// Strictly ascending
    pub(crate) keys: Vec<u64>,
    /// Parallel to `keys`
    pub(crate) values: Vec<String>,
    /// `keys.len() + 1` entries for internal nodes, empty for leaves
    pub(crate) children: Vec<Node>,
}

impl Node {
    pub(crate) fn new(leaf: bool) -> Self {
        Self {
            leaf,
            keys: Vec::with_capacity(MAX_KEYS),
            values: Vec::with_capacity(MAX_KEYS),
            children: if leaf {
                Vec::new()
            } else {
                Vec::with_capacity(MAX_KEYS + 1)
            },
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.keys.len() == MAX_KEYS
    }

    pub(crate) fn search(&self, key: u64) -> Option<&str> {
        match self.keys.binary_search(&key) {
            Ok(i) => Some(self.values[i].as_str()),
            Err(_) if self.leaf => None,
            Err(i) => self.children[i].search(key),
        }
    }

    pub(crate) fn value_mut(&mut self, key: u64) -> Option<&mut String> {
        match self.keys.binary_search(&key) {
            Ok(i) => Some(&mut self.values[i]),
            Err(_) if self.leaf => None,
            Err(i) => self.children[i].value_mut(key),
        }
    }

    /// Insert into a node that is known not to be full.
    ///
    /// Any full child on the descent path is split before it is entered, so
    /// no node is ever written while full.
    pub(crate) fn insert_non_full(&mut self, key: u64, value: String) {
        let mut idx = self.keys.partition_point(|&k| k < key);

        if self.leaf {
            self.keys.insert(idx, key);
            self.values.insert(idx, value);
            return;
        }

        if self.children[idx].is_full() {
            self.split_child(idx);
            if key > self.keys[idx] {
                idx += 1;
            }
        }
        self.children[idx].insert_non_full(key, value);
    }

    /// Split the full child at `index`.
    ///
    /// The child keeps `keys[..t-1]`, a new right sibling takes `keys[t..]`
    /// (and `children[t..]`), and the median `keys[t-1]` moves up into this
    /// node at `index`. The sibling becomes `children[index + 1]`.
    pub(crate) fn split_child(&mut self, index: usize) {
        let child = &mut self.children[index];
        debug_assert!(child.is_full());

        let mut sibling = Node::new(child.leaf);
        sibling.keys.extend(child.keys.drain(ORDER..));
        sibling.values.extend(child.values.drain(ORDER..));
        if !child.leaf {
            sibling.children.extend(child.children.drain(ORDER..));
        }

        let median_key = child.keys.remove(ORDER - 1);
        let median_value = child.values.remove(ORDER - 1);

        self.keys.insert(index, median_key);
        self.values.insert(index, median_value);
        self.children.insert(index + 1, sibling);
    }

    pub(crate) fn collect_into(&self, out: &mut Vec<(u64, String)>) {
        for (i, (key, value)) in self.keys.iter().zip(&self.values).enumerate() {
            if !self.leaf {
                self.children[i].collect_into(out);
            }
            out.push((*key, value.clone()));
        }
        if let Some(last) = self.children.last().filter(|_| !self.leaf) {
            last.collect_into(out);
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.keys.len() + self.children.iter().map(Node::count).sum::<usize>()
    }

    pub(crate) fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }
}
