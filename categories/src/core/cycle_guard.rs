//! Ancestor/descendant queries over a flat category list.

use std::collections::HashMap;

use crate::category::Category;

/// `id -> parent_id` lookup built once per snapshot.
#[derive(Debug, Clone)]
pub struct ParentIndex<'a> {
    parents: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> ParentIndex<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        let parents = categories
            .iter()
            .map(|c| (c.id.as_str(), c.parent_id.as_deref()))
            .collect();
        Self { parents }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&'a str> {
        self.parents.get(id).copied().flatten()
    }

    /// True if `ancestor_id` appears strictly above `descendant_id`.
    ///
    /// The walk is capped at the node count, so cyclic input yields `false`
    /// instead of looping.
    pub fn is_descendant(&self, ancestor_id: &str, descendant_id: &str) -> bool {
        let mut current = self.parent_of(descendant_id);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            steps += 1;
            if steps > self.parents.len() {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// True if following parents from `id` never reaches a root.
    pub fn is_in_cycle(&self, id: &str) -> bool {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(node) = current {
            if !self.contains(node) {
                return false;
            }
            steps += 1;
            if steps > self.parents.len() {
                return true;
            }
            current = self.parent_of(node);
        }
        false
    }
}

/// True if `descendant_id` sits anywhere below `ancestor_id`.
pub fn is_descendant(categories: &[Category], ancestor_id: &str, descendant_id: &str) -> bool {
    ParentIndex::new(categories).is_descendant(ancestor_id, descendant_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{child, root};

    fn chain() -> Vec<Category> {
        vec![root("a", 0), child("b", "a", 0), child("c", "b", 0), root("d", 1)]
    }

    #[test]
    fn detects_transitive_descendants() {
        let nodes = chain();
        assert!(is_descendant(&nodes, "a", "b"));
        assert!(is_descendant(&nodes, "a", "c"));
        assert!(!is_descendant(&nodes, "c", "a"));
        assert!(!is_descendant(&nodes, "d", "c"));
    }

    #[test]
    fn node_is_not_its_own_descendant() {
        assert!(!is_descendant(&chain(), "b", "b"));
    }

    #[test]
    fn unknown_ids_are_not_descendants() {
        let nodes = chain();
        assert!(!is_descendant(&nodes, "a", "missing"));
        assert!(!is_descendant(&nodes, "missing", "c"));
    }

    #[test]
    fn corrupt_cycle_terminates_with_false() {
        let nodes = vec![child("x", "y", 0), child("y", "x", 0)];
        assert!(!is_descendant(&nodes, "z", "x"));
        let index = ParentIndex::new(&nodes);
        assert!(index.is_in_cycle("x"));
    }

    #[test]
    fn dangling_parent_is_not_a_cycle() {
        let nodes = vec![child("x", "gone", 0)];
        let index = ParentIndex::new(&nodes);
        assert!(!index.is_in_cycle("x"));
        assert!(!index.is_descendant("gone", "gone"));
    }
}
