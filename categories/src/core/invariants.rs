//! Semantic invariants not expressible via JSON Schema.

use std::collections::{BTreeMap, HashSet};

use crate::category::Category;
use crate::core::cycle_guard::ParentIndex;

/// Check semantic invariants not expressible in JSON Schema:
/// - No duplicate ids
/// - Non-empty names and slugs
/// - No category is its own ancestor
/// - Sibling ranks are exactly `0..n-1`
/// - With `strict_parents`, no dangling `parent_id`
pub fn validate_invariants(categories: &[Category], strict_parents: bool) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for category in categories {
        if !seen.insert(category.id.as_str()) {
            errors.push(format!("duplicate id '{}'", category.id));
        }
        if category.name.trim().is_empty() {
            errors.push(format!("{}: name must be non-empty", category.id));
        }
        if category.slug.trim().is_empty() {
            errors.push(format!("{}: slug must be non-empty", category.id));
        }
    }

    let index = ParentIndex::new(categories);
    for category in categories {
        if index.is_in_cycle(&category.id) {
            errors.push(format!("{}: part of a parent cycle", category.id));
        }
    }

    if strict_parents {
        for (id, parent) in dangling_parents(categories) {
            errors.push(format!("{}: parent '{}' does not exist", id, parent));
        }
    }

    let parents: Vec<Option<&str>> = categories.iter().map(|c| c.parent_id.as_deref()).collect();
    errors.extend(rank_errors(categories, parents));
    errors
}

/// `(id, parent_id)` for every category whose parent is missing, sorted by id.
pub fn dangling_parents(categories: &[Category]) -> Vec<(String, String)> {
    let ids: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    let mut dangling: Vec<(String, String)> = categories
        .iter()
        .filter_map(|c| {
            let parent = c.parent_id.as_deref()?;
            (!ids.contains(parent)).then(|| (c.id.clone(), parent.to_string()))
        })
        .collect();
    dangling.sort();
    dangling
}

/// Report sibling groups under `parents` whose ranks are not exactly `0..n-1`.
pub fn rank_errors<'p>(
    categories: &[Category],
    parents: impl IntoIterator<Item = Option<&'p str>>,
) -> Vec<String> {
    let wanted: HashSet<Option<&str>> = parents.into_iter().collect();
    let mut groups: BTreeMap<Option<&str>, Vec<u32>> = BTreeMap::new();
    for category in categories {
        let parent = category.parent_id.as_deref();
        if wanted.contains(&parent) {
            groups.entry(parent).or_default().push(category.sort_order);
        }
    }

    let mut errors = Vec::new();
    for (parent, mut ranks) in groups {
        ranks.sort_unstable();
        let dense = ranks.iter().enumerate().all(|(i, rank)| *rank as usize == i);
        if !dense {
            errors.push(format!(
                "{}: sibling ranks {:?} must be 0..{}",
                group_label(parent),
                ranks,
                ranks.len()
            ));
        }
    }
    errors
}

fn group_label(parent: Option<&str>) -> String {
    match parent {
        Some(id) => format!("children of '{}'", id),
        None => "roots".to_string(),
    }
}
