use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A category record as stored by the catalog.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sort_order: u32,
}

impl Category {
    /// Position of this category among its siblings: `(parent_id, sort_order)`.
    pub fn placement(&self) -> (Option<&str>, u32) {
        (self.parent_id.as_deref(), self.sort_order)
    }
}

/// Sibling ordering shared by tree construction and move planning.
///
/// `sort_order` first, then `name` (case-sensitive), then `id` so the
/// comparator stays total when ranks collide.
pub fn sibling_order(a: &Category, b: &Category) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Persisted placement change for one category.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Update {
    pub id: String,
    pub parent_id: Option<String>,
    pub sort_order: u32,
}

/// Request payload for creating a category.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Display-only nested view of a category.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sort_order: u32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            parent_id: category.parent_id.clone(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            sort_order: category.sort_order,
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TreeNode::subtree_size)
            .sum::<usize>()
    }
}
