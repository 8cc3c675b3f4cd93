//! Command orchestration for the `categories` CLI.
//!
//! Each function wires the pure core and the file gateway together for one
//! command. Moves go through the [`Coordinator`] so the CLI exercises exactly
//! the path an interactive drag takes.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};

use crate::category::{Category, NewCategory, TreeNode, Update};
use crate::coordinator::{CommitOutcome, Coordinator, DropOutcome};
use crate::core::path::slug_path;
use crate::core::reorder_planner::plan;
use crate::core::tree_builder::build_tree_report;
use crate::core::types::DropPosition;
use crate::error::{CoordinatorError, PlanError};
use crate::exit_codes;
use crate::io::config::load_config;
use crate::io::gateway::FileGateway;
use crate::io::init::CatalogPaths;

/// Result of `categories validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub categories: usize,
    /// Ids whose parent does not exist (shown as roots).
    pub orphans: Vec<String>,
}

/// Validate `.categories/` layout, config, and store.
///
/// Dangling parents are reported as orphans, or rejected when the config sets
/// `strict_parents`.
pub fn validate_catalog(root: &Path) -> Result<ValidateOutcome> {
    let paths = CatalogPaths::new(root);
    if !paths.state_dir.is_dir() {
        bail!("missing directory {}", paths.state_dir.display());
    }
    for file in [&paths.store_path, &paths.schema_path] {
        if !file.is_file() {
            bail!("missing file {}", file.display());
        }
    }

    load_config(&paths.config_path).context("load config.toml")?;
    let gateway = FileGateway::open(root)?;
    let doc = gateway.load().context("load categories.json")?;
    let report = build_tree_report(&doc.categories);
    Ok(ValidateOutcome {
        categories: doc.categories.len(),
        orphans: report.orphans,
    })
}

/// Render a forest as an indented outline, one category per line.
pub fn render_tree(roots: &[TreeNode]) -> String {
    let mut out = String::new();
    for node in roots {
        render_node(&mut out, node, 0);
    }
    out
}

fn render_node(out: &mut String, node: &TreeNode, depth: usize) {
    let _ = writeln!(
        out,
        "{:indent$}{} ({}) [{}]",
        "",
        node.name,
        node.slug,
        node.id,
        indent = depth * 2
    );
    for child in &node.children {
        render_node(out, child, depth + 1);
    }
}

/// Load the catalog and render its tree.
///
/// Orphans are logged by the coordinator while hydrating.
pub async fn show_tree(root: &Path) -> Result<String> {
    let coordinator = Coordinator::hydrate(Arc::new(FileGateway::open(root)?)).await?;
    Ok(render_tree(&coordinator.tree()))
}

/// Arguments for `categories move`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub drag_id: String,
    pub target_id: String,
    pub position: DropPosition,
    /// Plan only; do not touch the store.
    pub dry_run: bool,
}

/// Result of `categories move`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    /// Placements changed by the move (empty for a no-op).
    pub updates: Vec<Update>,
    /// Slug path of the moved category after the move.
    pub path: Option<String>,
}

/// Move one category, driving the same gesture sequence as a drag and drop.
pub async fn move_category(root: &Path, request: &MoveRequest) -> Result<MoveReport> {
    let mut coordinator = Coordinator::hydrate(Arc::new(FileGateway::open(root)?)).await?;

    if request.dry_run {
        let planned = plan(
            coordinator.snapshot(),
            &request.drag_id,
            &request.target_id,
            request.position,
        )
        .map_err(CoordinatorError::from)?;
        return Ok(MoveReport {
            path: slug_path(&planned.categories, &request.drag_id),
            updates: planned.updates,
        });
    }

    coordinator.begin_drag(&request.drag_id)?;
    coordinator.hover(&request.target_id, request.position)?;
    let updates = match coordinator.drop()? {
        DropOutcome::Cancelled | DropOutcome::Unchanged => Vec::new(),
        DropOutcome::Committing { updates } => match coordinator.settle().await? {
            CommitOutcome::Reverted { warning } => return Err(anyhow!(warning)),
            CommitOutcome::Committed { .. } | CommitOutcome::Idle => updates,
        },
    };
    Ok(MoveReport {
        path: slug_path(coordinator.snapshot(), &request.drag_id),
        updates,
    })
}

/// Create a category through the coordinator.
pub async fn create_category(root: &Path, request: NewCategory) -> Result<Category> {
    let mut coordinator = Coordinator::hydrate(Arc::new(FileGateway::open(root)?)).await?;
    Ok(coordinator.create_node(request).await?)
}

/// Map a command failure to its stable exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CoordinatorError>() {
        Some(CoordinatorError::Plan(PlanError::Validation(_))) => exit_codes::REJECTED,
        Some(CoordinatorError::Plan(PlanError::NotFound { .. })) => exit_codes::NOT_FOUND,
        _ => exit_codes::INVALID,
    }
}
