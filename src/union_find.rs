//! Union-Find (disjoint-set) structure used for transitive place merging.
//!
//! Generic over the element type so the close-stop merge can key sets by
//! place index while tests may use arbitrary identifiers. Uses path
//! compression and union by rank; `groups()` canonicalizes roots to the
//! minimum member so output is deterministic regardless of union order.

use std::collections::HashMap;
use std::hash::Hash;

/// Disjoint-set forest over hashable elements.
#[derive(Debug, Default)]
pub struct UnionFind<T: Clone + Eq + Hash + Ord> {
    parent: HashMap<T, T>,
    rank: HashMap<T, u32>,
}

impl<T: Clone + Eq + Hash + Ord> UnionFind<T> {
    /// Create an empty structure.
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    /// Create an empty structure with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
            rank: HashMap::with_capacity(capacity),
        }
    }

    /// Register an element as its own singleton set. No-op if present.
    pub fn make_set(&mut self, item: T) {
        if !self.parent.contains_key(&item) {
            self.parent.insert(item.clone(), item.clone());
            self.rank.insert(item, 0);
        }
    }

    /// Find the representative of the set containing `item`, compressing
    /// the path along the way. The element must have been registered.
    pub fn find(&mut self, item: &T) -> T {
        let parent = self.parent[item].clone();
        if parent == *item {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(item.clone(), root.clone());
        root
    }

    /// Merge the sets containing `a` and `b`.
    pub fn union(&mut self, a: &T, b: &T) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }

        let rank_a = self.rank[&root_a];
        let rank_b = self.rank[&root_b];
        if rank_a < rank_b {
            self.parent.insert(root_a, root_b);
        } else if rank_a > rank_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_b, root_a.clone());
            self.rank.insert(root_a, rank_a + 1);
        }
    }

    /// Whether two elements belong to the same set.
    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether no elements are registered.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Materialize all sets as `min-member -> sorted members`.
    ///
    /// Keying by the minimum member (instead of the internal root) makes the
    /// result independent of union order and HashMap iteration order.
    pub fn groups(&mut self) -> HashMap<T, Vec<T>> {
        let items: Vec<T> = self.parent.keys().cloned().collect();

        let mut by_root: HashMap<T, Vec<T>> = HashMap::new();
        for item in items {
            let root = self.find(&item);
            by_root.entry(root).or_default().push(item);
        }

        let mut groups = HashMap::with_capacity(by_root.len());
        for (_, mut members) in by_root {
            members.sort();
            let key = members[0].clone();
            groups.insert(key, members);
        }
        groups
    }
}
