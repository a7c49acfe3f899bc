//! In-order iterator over a B-Tree

use super::node::Node;

/// Yields `(key, value)` pairs in ascending key order without cloning.
pub struct Iter<'a> {
    /// Nodes on the current descent path with the next key index to visit
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> Iter<'a> {
    pub(super) fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        if let Some(root) = root {
            iter.push_left_spine(root);
        }
        iter
    }

    fn push_left_spine(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) if !node.leaf => node = child,
                _ => break,
            }
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (u64, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, idx) = {
                let top = self.stack.last_mut()?;
                let current = (top.0, top.1);
                top.1 += 1;
                current
            };

            if idx < node.keys.len() {
                if !node.leaf {
                    self.push_left_spine(&node.children[idx + 1]);
                }
                return Some((node.keys[idx], node.values[idx].as_str()));
            }
            self.stack.pop();
        }
    }
}
