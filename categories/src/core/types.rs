//! Shared deterministic types for the reorder engine.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::{Category, Update};

/// Where a dragged category lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Immediately before the target, under the target's parent.
    Before,
    /// Immediately after the target, under the target's parent.
    After,
    /// Last child of the target.
    Inside,
}

impl DropPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Inside => "inside",
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DropPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "inside" => Ok(Self::Inside),
            other => Err(format!(
                "invalid drop position '{other}' (expected before, after or inside)"
            )),
        }
    }
}

/// Output of the reorder planner.
///
/// `categories` keeps the input order of the snapshot; only placements change.
/// `updates` is sorted by category id so serialized batches stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanResult {
    pub categories: Vec<Category>,
    pub updates: Vec<Update>,
}

impl PlanResult {
    pub fn unchanged(categories: &[Category]) -> Self {
        Self {
            categories: categories.to_vec(),
            updates: Vec::new(),
        }
    }

    /// True when applying the plan would not persist anything.
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}
