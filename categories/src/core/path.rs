//! Helpers for rendering storefront category paths.

use std::collections::HashMap;

use crate::category::Category;

/// Return the `/`-separated slug path from the root down to `target_id`.
///
/// Stops at a dangling parent (the path starts there). Returns `None` for an
/// unknown id or a parent cycle.
pub fn slug_path(categories: &[Category], target_id: &str) -> Option<String> {
    let by_id: HashMap<&str, &Category> = categories.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut segments = Vec::new();
    let mut current = by_id.get(target_id).copied();
    while let Some(category) = current {
        if segments.len() > by_id.len() {
            return None;
        }
        segments.push(category.slug.as_str());
        current = category
            .parent_id
            .as_deref()
            .and_then(|parent| by_id.get(parent).copied());
    }

    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join("/"))
}
