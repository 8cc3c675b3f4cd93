//! Nested display tree from a flat, parent-referencing category list.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::category::{Category, TreeNode, sibling_order};

/// Forest plus the ids that had to be promoted to roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltTree {
    pub roots: Vec<TreeNode>,
    /// Categories placed among the roots because their parent is missing
    /// (or unreachable through a parent cycle). Sorted by id.
    pub orphans: Vec<String>,
}

/// Build the display forest. See [`build_tree_report`].
pub fn build_tree(categories: &[Category]) -> Vec<TreeNode> {
    build_tree_report(categories).roots
}

/// Build the display forest and report promoted orphans.
///
/// Every input category appears exactly once. Siblings are ordered by
/// `(sort_order, name, id)`.
pub fn build_tree_report(categories: &[Category]) -> BuiltTree {
    let ids: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();

    let mut children: HashMap<&str, Vec<&Category>> = HashMap::new();
    let mut roots: Vec<&Category> = Vec::new();
    let mut orphans: Vec<String> = Vec::new();

    for category in categories {
        match category.parent_id.as_deref() {
            Some(parent) if parent != category.id && ids.contains(parent) => {
                children.entry(parent).or_default().push(category);
            }
            Some(_) => {
                orphans.push(category.id.clone());
                roots.push(category);
            }
            None => roots.push(category),
        }
    }
    for group in children.values_mut() {
        group.sort_by(|a, b| sibling_order(a, b));
    }
    roots.sort_by(|a, b| sibling_order(a, b));

    let mut visited: HashSet<&str> = HashSet::new();
    let mut built: Vec<(&Category, TreeNode)> = roots
        .iter()
        .map(|&root| (root, build_subtree(root, &children, &mut visited)))
        .collect();

    // Anything still unvisited hangs off a parent cycle.
    let mut stranded: Vec<&Category> = categories
        .iter()
        .filter(|c| !visited.contains(c.id.as_str()))
        .collect();
    stranded.sort_by(|a, b| sibling_order(a, b));
    for category in stranded {
        if visited.contains(category.id.as_str()) {
            continue;
        }
        orphans.push(category.id.clone());
        built.push((category, build_subtree(category, &children, &mut visited)));
    }

    built.sort_by(|(a, _), (b, _)| sibling_order(a, b));
    orphans.sort();

    BuiltTree {
        roots: built.into_iter().map(|(_, node)| node).collect(),
        orphans,
    }
}

fn build_subtree<'a>(
    category: &'a Category,
    children: &HashMap<&'a str, Vec<&'a Category>>,
    visited: &mut HashSet<&'a str>,
) -> TreeNode {
    visited.insert(category.id.as_str());
    let mut node = TreeNode::leaf(category);
    if let Some(group) = children.get(category.id.as_str()) {
        for &child in group {
            if visited.contains(child.id.as_str()) {
                continue;
            }
            node.children.push(build_subtree(child, children, visited));
        }
    }
    node
}
