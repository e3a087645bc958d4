//! Subscription matcher
//!
//! A prefix tree over the fixed segments of subscription patterns. Lookup
//! walks literal children, the `+` child and any `#` entries in one pass, so
//! matching cost is bounded by topic depth rather than route count.
//!
//! Values are returned in insertion order, which the engine uses to honor
//! configuration-declaration order among equally-matching routes.

use std::collections::HashMap;

use crate::pattern::{Segment, TopicPattern};

/// Order-preserving subscription tree
///
/// Compiled once at startup; lookups are read-only and pure.
#[derive(Debug)]
pub struct TopicTree<T> {
    root: Node<T>,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    /// Fixed-segment children
    literals: HashMap<String, Node<T>>,

    /// `+` child, if any pattern has a single-level wildcard here
    plus: Option<Box<Node<T>>>,

    /// Values of patterns ending in `#` at this depth
    hash: Vec<Entry<T>>,

    /// Values of patterns ending exactly at this node
    terminal: Vec<Entry<T>>,
}

#[derive(Debug)]
struct Entry<T> {
    seq: usize,
    value: T,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            literals: HashMap::new(),
            plus: None,
            hash: Vec::new(),
            terminal: Vec::new(),
        }
    }
}

impl<T> Default for TopicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TopicTree<T> {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }

    /// Number of inserted patterns
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the tree is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a pattern with its associated value
    ///
    /// Insertion order defines the order values are returned from
    /// [`TopicTree::matches`].
    pub fn insert(&mut self, pattern: TopicPattern, value: T) {
        let seq = self.len;
        self.len += 1;

        let mut node = &mut self.root;
        for segment in pattern.segments() {
            match segment {
                Segment::Literal(text) => {
                    node = node.literals.entry(text.clone()).or_default();
                }
                Segment::Plus => {
                    node = node.plus.get_or_insert_with(Box::default);
                }
                Segment::Hash => {
                    node.hash.push(Entry { seq, value });
                    return;
                }
            }
        }
        node.terminal.push(Entry { seq, value });
    }

    /// Collect the values of every pattern matching a concrete topic
    ///
    /// Values appear in insertion order. Repeated calls with the same topic
    /// return the same list.
    pub fn matches(&self, topic: &str) -> Vec<&T> {
        let levels: Vec<&str> = topic.split('/').collect();
        let mut found: Vec<(usize, &T)> = Vec::new();
        collect(&self.root, &levels, 0, &mut found);

        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, value)| value).collect()
    }
}

fn collect<'a, T>(node: &'a Node<T>, levels: &[&str], depth: usize, out: &mut Vec<(usize, &'a T)>) {
    // A '#' at this depth matches iff at least one level remains.
    if depth < levels.len() {
        for entry in &node.hash {
            out.push((entry.seq, &entry.value));
        }
    }

    if depth == levels.len() {
        for entry in &node.terminal {
            out.push((entry.seq, &entry.value));
        }
        return;
    }

    if let Some(child) = node.literals.get(levels[depth]) {
        collect(child, levels, depth + 1, out);
    }
    if let Some(child) = &node.plus {
        collect(child, levels, depth + 1, out);
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tests;
