//! Move planning: next placements plus the minimal persisted diff.
//!
//! Planning is pure. The caller owns the snapshot and decides whether to apply
//! [`PlanResult::categories`] locally and send [`PlanResult::updates`] on.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::category::{Category, Update, sibling_order};
use crate::core::cycle_guard::ParentIndex;
use crate::core::invariants::rank_errors;
use crate::core::types::{DropPosition, PlanResult};
use crate::error::PlanError;

/// Plan moving `drag_id` relative to `target_id`.
///
/// Every touched sibling group is renumbered `0..n-1`. Only categories whose
/// `(parent_id, sort_order)` actually changes produce an [`Update`].
pub fn plan(
    categories: &[Category],
    drag_id: &str,
    target_id: &str,
    position: DropPosition,
) -> Result<PlanResult, PlanError> {
    if drag_id == target_id {
        return Ok(PlanResult::unchanged(categories));
    }

    let drag = find(categories, drag_id).ok_or_else(|| PlanError::not_found(drag_id))?;
    let target = find(categories, target_id).ok_or_else(|| PlanError::not_found(target_id))?;

    let new_parent = match position {
        DropPosition::Inside => Some(target.id.as_str()),
        DropPosition::Before | DropPosition::After => target.parent_id.as_deref(),
    };
    if let Some(parent) = new_parent {
        let index = ParentIndex::new(categories);
        if parent == drag_id || index.is_descendant(drag_id, parent) {
            return Err(PlanError::cycle());
        }
    }

    let old_parent = drag.parent_id.as_deref();
    let old_siblings = sibling_ids(categories, old_parent, drag_id);
    let mut new_order = if old_parent == new_parent {
        old_siblings.clone()
    } else {
        sibling_ids(categories, new_parent, drag_id)
    };

    let insert_at = match position {
        DropPosition::Inside => new_order.len(),
        DropPosition::Before | DropPosition::After => {
            let at = new_order
                .iter()
                .position(|id| *id == target_id)
                .ok_or_else(|| PlanError::not_found(target_id))?;
            if position == DropPosition::After {
                at + 1
            } else {
                at
            }
        }
    };
    new_order.insert(insert_at, drag_id);

    let mut placements: HashMap<&str, (Option<&str>, u32)> = HashMap::new();
    if old_parent != new_parent {
        for (rank, &id) in old_siblings.iter().enumerate() {
            placements.insert(id, (old_parent, rank as u32));
        }
    }
    for (rank, &id) in new_order.iter().enumerate() {
        placements.insert(id, (new_parent, rank as u32));
    }

    let next: Vec<Category> = categories
        .iter()
        .map(|category| match placements.get(category.id.as_str()) {
            Some((parent, rank)) => Category {
                parent_id: parent.map(str::to_string),
                sort_order: *rank,
                ..category.clone()
            },
            None => category.clone(),
        })
        .collect();

    let updates = diff(categories, &next);
    Ok(PlanResult {
        categories: next,
        updates,
    })
}

/// Minimal update list turning `prev` into `next`, sorted by id.
///
/// Categories are matched by id; ids missing from `prev` count as changed.
pub fn diff(prev: &[Category], next: &[Category]) -> Vec<Update> {
    let before: HashMap<&str, (Option<&str>, u32)> = prev
        .iter()
        .map(|c| (c.id.as_str(), c.placement()))
        .collect();

    let mut updates: Vec<Update> = next
        .iter()
        .filter(|c| before.get(c.id.as_str()) != Some(&c.placement()))
        .map(|c| Update {
            id: c.id.clone(),
            parent_id: c.parent_id.clone(),
            sort_order: c.sort_order,
        })
        .collect();
    updates.sort_by(|a, b| a.id.cmp(&b.id));
    updates
}

/// Apply an update batch all-or-nothing.
///
/// Rejects unknown or repeated ids, and any result where an updated category
/// ends up in a parent cycle or a touched sibling group is not ranked `0..n-1`.
pub fn apply_updates(categories: &[Category], updates: &[Update]) -> Result<Vec<Category>, String> {
    let known: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    let mut by_id: HashMap<&str, &Update> = HashMap::new();
    for update in updates {
        if !known.contains(update.id.as_str()) {
            return Err(format!("update references unknown category '{}'", update.id));
        }
        if by_id.insert(update.id.as_str(), update).is_some() {
            return Err(format!("category '{}' updated twice in one batch", update.id));
        }
    }

    let mut touched: BTreeSet<Option<&str>> = BTreeSet::new();
    let next: Vec<Category> = categories
        .iter()
        .map(|category| match by_id.get(category.id.as_str()) {
            Some(update) => {
                touched.insert(category.parent_id.as_deref());
                touched.insert(update.parent_id.as_deref());
                Category {
                    parent_id: update.parent_id.clone(),
                    sort_order: update.sort_order,
                    ..category.clone()
                }
            }
            None => category.clone(),
        })
        .collect();

    let index = ParentIndex::new(&next);
    let mut cyclic: Vec<&str> = by_id
        .keys()
        .copied()
        .filter(|id| index.is_in_cycle(id))
        .collect();
    if !cyclic.is_empty() {
        cyclic.sort_unstable();
        return Err(format!(
            "batch would create a parent cycle at: {}",
            cyclic.join(", ")
        ));
    }

    let errors = rank_errors(&next, touched);
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }
    Ok(next)
}

fn find<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.id == id)
}

/// Ids of the group under `parent`, minus `exclude`, in current relative order.
fn sibling_ids<'a>(
    categories: &'a [Category],
    parent: Option<&str>,
    exclude: &str,
) -> Vec<&'a str> {
    let mut group: Vec<&Category> = categories
        .iter()
        .filter(|c| c.parent_id.as_deref() == parent && c.id != exclude)
        .collect();
    group.sort_by(|a, b| sibling_order(a, b));
    group.into_iter().map(|c| c.id.as_str()).collect()
}
