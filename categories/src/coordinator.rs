//! Canonical snapshot owner for the category tree manager.
//!
//! The coordinator turns gesture messages into planned moves, applies each
//! plan optimistically, and sends its update batch to the gateway on a
//! spawned task. Batches are serialized: while one is in flight, further drops
//! are refused with [`CoordinatorError::CommitInFlight`] until [`settle`]
//! resolves it. A failed batch is never retried; the snapshot is replaced by a
//! full reload instead.
//!
//! [`settle`]: Coordinator::settle

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::category::{Category, NewCategory, TreeNode, Update};
use crate::core::gesture::{DropRequest, GestureEvent, GestureState};
use crate::core::reorder_planner::plan;
use crate::core::slug::{is_valid_slug, slugify};
use crate::core::tree_builder::{BuiltTree, build_tree_report};
use crate::core::types::DropPosition;
use crate::error::{CoordinatorError, PlanError};
use crate::io::gateway::CategoryGateway;

/// Persistence side of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    /// No batch in flight.
    Settled,
    /// Optimistic snapshot applied; batch sent, awaiting the gateway.
    Committing,
    /// Gateway rejected the batch; canonical reload pending or failed.
    Reverting,
}

/// Combined view of gesture and persistence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dragging,
    HoverTarget,
    Committing,
    Reverting,
}

/// Result of a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released without a hover target; nothing planned.
    Cancelled,
    /// Planned, but no category changes placement.
    Unchanged,
    /// Snapshot updated optimistically and `updates` sent to the gateway.
    Committing { updates: Vec<Update> },
}

/// Result of resolving an in-flight batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing was in flight.
    Idle,
    /// Gateway accepted the batch.
    Committed { updates: usize },
    /// Gateway rejected the batch; the snapshot was reloaded.
    Reverted { warning: String },
}

pub struct Coordinator<G> {
    gateway: Arc<G>,
    snapshot: Vec<Category>,
    gesture: GestureState,
    commit: CommitPhase,
    in_flight: Option<JoinHandle<Result<()>>>,
    pending: usize,
}

impl<G: CategoryGateway + 'static> Coordinator<G> {
    /// Create a coordinator over an already-known snapshot.
    pub fn new(gateway: Arc<G>, snapshot: Vec<Category>) -> Self {
        Self {
            gateway,
            snapshot,
            gesture: GestureState::Idle,
            commit: CommitPhase::Settled,
            in_flight: None,
            pending: 0,
        }
    }

    /// Fetch the canonical list and start idle.
    pub async fn hydrate(gateway: Arc<G>) -> Result<Self> {
        let mut coordinator = Self::new(gateway, Vec::new());
        coordinator.reload().await?;
        Ok(coordinator)
    }

    pub fn snapshot(&self) -> &[Category] {
        &self.snapshot
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn commit_phase(&self) -> CommitPhase {
        self.commit
    }

    pub fn phase(&self) -> Phase {
        match (self.commit, &self.gesture) {
            (CommitPhase::Committing, _) => Phase::Committing,
            (CommitPhase::Reverting, _) => Phase::Reverting,
            (CommitPhase::Settled, GestureState::Idle) => Phase::Idle,
            (CommitPhase::Settled, GestureState::Dragging { .. }) => Phase::Dragging,
            (CommitPhase::Settled, GestureState::HoverTarget { .. }) => Phase::HoverTarget,
        }
    }

    /// Display forest for the current snapshot.
    pub fn tree(&self) -> Vec<TreeNode> {
        self.tree_report().roots
    }

    pub fn tree_report(&self) -> BuiltTree {
        build_tree_report(&self.snapshot)
    }

    /// Start dragging `node_id`.
    pub fn begin_drag(&mut self, node_id: &str) -> Result<(), CoordinatorError> {
        if !self.snapshot.iter().any(|c| c.id == node_id) {
            return Err(PlanError::not_found(node_id).into());
        }
        self.dispatch(GestureEvent::BeginDrag {
            node_id: node_id.to_string(),
        })
        .map(|_| ())
    }

    /// Record the drop zone currently under the pointer.
    pub fn hover(&mut self, target_id: &str, position: DropPosition) -> Result<(), CoordinatorError> {
        self.dispatch(GestureEvent::Hover {
            target_id: target_id.to_string(),
            position,
        })
        .map(|_| ())
    }

    /// Abandon the current gesture without planning.
    pub fn cancel(&mut self) {
        self.gesture = GestureState::Idle;
    }

    /// Release the pointer over the recorded drop zone.
    ///
    /// # Panics
    ///
    /// A drop that changes placements spawns its commit with `tokio::spawn`,
    /// which panics when called outside a Tokio runtime.
    pub fn drop(&mut self) -> Result<DropOutcome, CoordinatorError> {
        self.dispatch(GestureEvent::Drop)
    }

    /// Feed one gesture message through the state machine.
    ///
    /// Only `Drop` can produce anything other than [`DropOutcome::Cancelled`].
    ///
    /// # Panics
    ///
    /// Same as [`Coordinator::drop`].
    pub fn dispatch(&mut self, event: GestureEvent) -> Result<DropOutcome, CoordinatorError> {
        let is_drop = matches!(event, GestureEvent::Drop);
        let (next, request) = match self.gesture.apply(event) {
            Ok(step) => step,
            Err(err) => {
                if is_drop {
                    self.gesture = GestureState::Idle;
                }
                return Err(err.into());
            }
        };
        self.gesture = next;
        match request {
            Some(request) => self.commit_drop(request),
            None => Ok(DropOutcome::Cancelled),
        }
    }

    #[instrument(skip_all, fields(drag = %request.drag_id, target = %request.target_id, position = %request.position))]
    fn commit_drop(&mut self, request: DropRequest) -> Result<DropOutcome, CoordinatorError> {
        if self.commit != CommitPhase::Settled {
            debug!(ready = self.commit_ready(), "drop refused until the batch is settled");
            return Err(CoordinatorError::CommitInFlight);
        }

        let planned = plan(
            &self.snapshot,
            &request.drag_id,
            &request.target_id,
            request.position,
        )
        .inspect_err(|err| info!(error = %err, "move rejected"))?;

        if planned.is_noop() {
            debug!("move leaves every placement unchanged");
            return Ok(DropOutcome::Unchanged);
        }

        self.snapshot = planned.categories;
        self.commit = CommitPhase::Committing;
        let updates = planned.updates;
        let batch = updates.clone();
        self.pending = batch.len();
        let gateway = Arc::clone(&self.gateway);
        self.in_flight = Some(tokio::spawn(
            async move { gateway.bulk_reorder(batch).await },
        ));
        info!(updates = updates.len(), "reorder sent");
        Ok(DropOutcome::Committing { updates })
    }

    /// True when the in-flight batch has resolved and [`Coordinator::settle`]
    /// will return without waiting. Drops stay refused until it is called.
    pub fn commit_ready(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| handle.is_finished())
    }

    /// Wait for the in-flight batch, reloading on failure.
    ///
    /// A rejected batch is reported as [`CommitOutcome::Reverted`]. Only a
    /// failed reload is returned as an error; the phase then stays
    /// [`CommitPhase::Reverting`] until [`Coordinator::reload`] succeeds.
    pub async fn settle(&mut self) -> Result<CommitOutcome> {
        let Some(handle) = self.in_flight.take() else {
            if self.commit == CommitPhase::Reverting {
                self.reload().await?;
            }
            return Ok(CommitOutcome::Idle);
        };

        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(anyhow!("reorder task failed: {join_err}")),
        };

        match result {
            Ok(()) => {
                self.commit = CommitPhase::Settled;
                Ok(CommitOutcome::Committed {
                    updates: std::mem::take(&mut self.pending),
                })
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "reorder failed, reloading categories");
                self.pending = 0;
                self.commit = CommitPhase::Reverting;
                self.reload()
                    .await
                    .context("reload after rejected reorder")?;
                Ok(CommitOutcome::Reverted {
                    warning: format!("Could not save the new order ({err:#}); reloaded categories."),
                })
            }
        }
    }

    /// Replace the snapshot with the gateway's canonical list.
    ///
    /// Refused while a batch is in flight; call [`Coordinator::settle`] first.
    pub async fn reload(&mut self) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(anyhow!("cannot reload while a reorder is in flight"));
        }
        let categories = self
            .gateway
            .list_categories()
            .await
            .context("list categories")?;
        let report = build_tree_report(&categories);
        if !report.orphans.is_empty() {
            warn!(orphans = ?report.orphans, "categories with missing parents shown as roots");
        }
        self.snapshot = categories;
        self.commit = CommitPhase::Settled;
        debug!(count = self.snapshot.len(), "snapshot reloaded");
        Ok(())
    }

    /// Create a category under `parent_id` (or as a root) via the gateway.
    ///
    /// Refused with [`CoordinatorError::CommitInFlight`] until an in-flight
    /// reorder is settled: the gateway ranks the new category against its own
    /// state, which does not include the optimistic move yet.
    #[instrument(skip_all, fields(name = %request.name))]
    pub async fn create_node(&mut self, request: NewCategory) -> Result<Category, CoordinatorError> {
        if self.commit != CommitPhase::Settled {
            return Err(CoordinatorError::CommitInFlight);
        }
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CoordinatorError::InvalidInput(
                "category name must be non-empty".to_string(),
            ));
        }
        let slug = match &request.slug {
            Some(slug) => slug.clone(),
            None => slugify(name),
        };
        if slug.is_empty() {
            return Err(CoordinatorError::InvalidInput(format!(
                "cannot derive a slug from '{name}'; provide one"
            )));
        }
        if !is_valid_slug(&slug) {
            return Err(CoordinatorError::InvalidInput(format!(
                "invalid slug '{slug}' (use lowercase letters, digits and '-')"
            )));
        }
        if let Some(parent) = request.parent_id.as_deref()
            && !self.snapshot.iter().any(|c| c.id == parent)
        {
            return Err(PlanError::not_found(parent).into());
        }

        let created = self
            .gateway
            .create_category(NewCategory {
                name: name.to_string(),
                slug: Some(slug),
                ..request
            })
            .await
            .map_err(CoordinatorError::Network)?;
        info!(id = %created.id, sort_order = created.sort_order, "category created");
        self.snapshot.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CYCLE_MESSAGE;
    use crate::test_support::{ScriptedCommit, ScriptedGateway, child, children_of, find, root};

    fn scenario() -> Vec<Category> {
        vec![root("A", 0), root("B", 1), child("C", "A", 0)]
    }

    async fn coordinator(gateway: ScriptedGateway) -> Coordinator<ScriptedGateway> {
        Coordinator::hydrate(Arc::new(gateway))
            .await
            .expect("hydrate")
    }

    #[tokio::test]
    async fn drop_applies_optimistically_then_commits() {
        let mut coord = coordinator(ScriptedGateway::new(scenario())).await;

        coord.begin_drag("B").expect("begin");
        assert_eq!(coord.phase(), Phase::Dragging);
        coord.hover("A", DropPosition::Inside).expect("hover");
        assert_eq!(coord.phase(), Phase::HoverTarget);

        let outcome = coord.drop().expect("drop");
        assert!(matches!(outcome, DropOutcome::Committing { ref updates } if updates.len() == 1));
        assert_eq!(coord.phase(), Phase::Committing);
        assert_eq!(find(coord.snapshot(), "B").parent_id.as_deref(), Some("A"));

        let settled = coord.settle().await.expect("settle");
        assert_eq!(settled, CommitOutcome::Committed { updates: 1 });
        assert_eq!(coord.phase(), Phase::Idle);
        assert_eq!(children_of(&coord.gateway.remote(), Some("A")), vec!["C", "B"]);
    }

    #[tokio::test]
    async fn rejected_batch_reloads_canonical_snapshot() {
        let gateway = ScriptedGateway::new(scenario());
        gateway.script([ScriptedCommit::Reject("constraint violated".to_string())]);
        let mut coord = coordinator(gateway).await;

        coord.begin_drag("B").expect("begin");
        coord.hover("A", DropPosition::Inside).expect("hover");
        coord.drop().expect("drop");

        let settled = coord.settle().await.expect("settle");
        match settled {
            CommitOutcome::Reverted { warning } => assert!(warning.contains("constraint violated")),
            other => panic!("expected revert, got {other:?}"),
        }
        assert_eq!(coord.snapshot(), scenario().as_slice());
        assert_eq!(coord.phase(), Phase::Idle);
        assert_eq!(coord.gateway.list_calls(), 2);
    }

    #[tokio::test]
    async fn cycle_rejection_leaves_snapshot_and_network_untouched() {
        let mut coord = coordinator(ScriptedGateway::new(scenario())).await;

        coord.begin_drag("A").expect("begin");
        coord.hover("C", DropPosition::Inside).expect("hover");
        let err = coord.drop().expect_err("cycle");

        assert_eq!(err.user_message(), CYCLE_MESSAGE);
        assert_eq!(coord.snapshot(), scenario().as_slice());
        assert_eq!(coord.phase(), Phase::Idle);
        assert!(coord.gateway.received().is_empty());
    }

    #[tokio::test]
    async fn drop_while_committing_is_refused() {
        let mut coord = coordinator(ScriptedGateway::gated(scenario())).await;

        coord.begin_drag("B").expect("begin");
        coord.hover("A", DropPosition::Inside).expect("hover");
        coord.drop().expect("first drop");
        let optimistic = coord.snapshot().to_vec();

        // A new gesture may start while the first batch is in flight.
        coord.begin_drag("C").expect("begin second");
        coord.hover("A", DropPosition::After).expect("hover second");
        let err = coord.drop().expect_err("serialized");
        assert!(matches!(err, CoordinatorError::CommitInFlight));
        assert_eq!(coord.snapshot(), optimistic.as_slice());
        assert_eq!(*coord.gesture(), GestureState::Idle);

        coord.gateway.release_commit();
        coord.settle().await.expect("settle");
        assert_eq!(coord.gateway.received().len(), 1);

        coord.begin_drag("C").expect("begin third");
        coord.hover("A", DropPosition::After).expect("hover third");
        assert!(matches!(
            coord.drop().expect("third drop"),
            DropOutcome::Committing { .. }
        ));
    }

    #[tokio::test]
    async fn create_while_committing_is_refused() {
        let mut coord = coordinator(ScriptedGateway::gated(scenario())).await;

        coord.begin_drag("B").expect("begin");
        coord.hover("A", DropPosition::Inside).expect("hover");
        coord.drop().expect("drop");
        let optimistic = coord.snapshot().to_vec();

        let err = coord
            .create_node(NewCategory {
                name: "New".to_string(),
                parent_id: Some("A".to_string()),
                ..NewCategory::default()
            })
            .await
            .expect_err("serialized");
        assert!(matches!(err, CoordinatorError::CommitInFlight));
        assert_eq!(coord.snapshot(), optimistic.as_slice());
        assert_eq!(coord.gateway.remote().len(), 3);

        coord.gateway.release_commit();
        assert_eq!(
            coord.settle().await.expect("settle"),
            CommitOutcome::Committed { updates: 1 }
        );
        let created = coord
            .create_node(NewCategory {
                name: "New".to_string(),
                parent_id: Some("A".to_string()),
                ..NewCategory::default()
            })
            .await
            .expect("create after settle");
        assert_eq!(created.sort_order, 2);
        assert_eq!(
            children_of(coord.snapshot(), Some("A")),
            vec!["C", "B", created.id.as_str()]
        );
    }

    #[tokio::test]
    async fn commit_ready_reports_resolved_batch() {
        let mut coord = coordinator(ScriptedGateway::gated(scenario())).await;
        assert!(!coord.commit_ready());

        coord.begin_drag("B").expect("begin");
        coord.hover("A", DropPosition::Inside).expect("hover");
        coord.drop().expect("drop");
        assert!(!coord.commit_ready());

        coord.gateway.release_commit();
        while !coord.commit_ready() {
            tokio::task::yield_now().await;
        }
        assert_eq!(coord.phase(), Phase::Committing);
        assert!(matches!(
            coord.settle().await.expect("settle"),
            CommitOutcome::Committed { .. }
        ));
        assert!(!coord.commit_ready());
    }

    #[tokio::test]
    async fn cancel_and_targetless_drop_do_nothing() {
        let mut coord = coordinator(ScriptedGateway::new(scenario())).await;

        coord.begin_drag("B").expect("begin");
        coord.hover("A", DropPosition::Inside).expect("hover");
        coord.cancel();
        assert_eq!(coord.phase(), Phase::Idle);

        coord.begin_drag("B").expect("begin");
        assert_eq!(coord.drop().expect("drop"), DropOutcome::Cancelled);
        assert_eq!(coord.snapshot(), scenario().as_slice());
        assert!(coord.gateway.received().is_empty());
    }

    #[tokio::test]
    async fn noop_drop_sends_nothing() {
        let mut coord = coordinator(ScriptedGateway::new(scenario())).await;
        coord.begin_drag("A").expect("begin");
        coord.hover("B", DropPosition::Before).expect("hover");
        assert_eq!(coord.drop().expect("drop"), DropOutcome::Unchanged);
        assert_eq!(coord.settle().await.expect("settle"), CommitOutcome::Idle);
        assert!(coord.gateway.received().is_empty());
    }

    #[tokio::test]
    async fn stale_target_is_not_found() {
        let mut coord = coordinator(ScriptedGateway::new(scenario())).await;
        assert!(matches!(
            coord.begin_drag("zzz"),
            Err(CoordinatorError::Plan(PlanError::NotFound { .. }))
        ));

        coord.begin_drag("A").expect("begin");
        coord.hover("removed", DropPosition::Before).expect("hover");
        let err = coord.drop().expect_err("not found");
        assert!(matches!(err, CoordinatorError::Plan(PlanError::NotFound { .. })));
        assert!(err.is_local());
    }

    #[tokio::test]
    async fn failed_reload_stays_reverting_until_retried() {
        let gateway = ScriptedGateway::new(scenario());
        gateway.script([ScriptedCommit::Reject("offline".to_string())]);
        let mut coord = coordinator(gateway).await;
        coord.gateway.fail_next_lists(1);

        coord.begin_drag("B").expect("begin");
        coord.hover("A", DropPosition::Inside).expect("hover");
        coord.drop().expect("drop");

        assert!(coord.settle().await.is_err());
        assert_eq!(coord.phase(), Phase::Reverting);

        assert_eq!(coord.settle().await.expect("retry"), CommitOutcome::Idle);
        assert_eq!(coord.phase(), Phase::Idle);
        assert_eq!(coord.snapshot(), scenario().as_slice());
    }

    #[tokio::test]
    async fn create_node_appends_after_siblings() {
        let mut coord = coordinator(ScriptedGateway::new(scenario())).await;

        let created = coord
            .create_node(NewCategory {
                name: "Kids' Wear".to_string(),
                parent_id: Some("A".to_string()),
                ..NewCategory::default()
            })
            .await
            .expect("create");

        assert_eq!(created.sort_order, 1);
        assert_eq!(created.slug, "kids-wear");
        assert_eq!(children_of(coord.snapshot(), Some("A")), vec!["C", created.id.as_str()]);
    }

    #[tokio::test]
    async fn create_node_validates_before_calling_gateway() {
        let mut coord = coordinator(ScriptedGateway::new(scenario())).await;

        let blank = coord
            .create_node(NewCategory {
                name: "   ".to_string(),
                ..NewCategory::default()
            })
            .await
            .expect_err("blank");
        assert!(matches!(blank, CoordinatorError::InvalidInput(_)));

        let bad_slug = coord
            .create_node(NewCategory {
                name: "Socks".to_string(),
                slug: Some("Socks!".to_string()),
                ..NewCategory::default()
            })
            .await
            .expect_err("bad slug");
        assert!(matches!(bad_slug, CoordinatorError::InvalidInput(_)));

        let orphan = coord
            .create_node(NewCategory {
                name: "Socks".to_string(),
                parent_id: Some("missing".to_string()),
                ..NewCategory::default()
            })
            .await
            .expect_err("orphan");
        assert!(matches!(orphan, CoordinatorError::Plan(PlanError::NotFound { .. })));
        assert_eq!(coord.gateway.remote().len(), 3);
    }
}
