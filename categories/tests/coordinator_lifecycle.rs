//! Lifecycle tests for the coordinator against scripted and file gateways.
//!
//! Drives complete gestures (drag, hover, drop, settle) and checks the
//! optimistic snapshot, the batches that reach the gateway, and recovery by
//! reload when a batch is rejected.

use std::sync::Arc;

use categories::category::NewCategory;
use categories::coordinator::{CommitOutcome, Coordinator, DropOutcome, Phase};
use categories::core::gesture::GestureEvent;
use categories::core::types::DropPosition;
use categories::error::CoordinatorError;
use categories::io::gateway::CategoryGateway;
use categories::test_support::{
    ScriptedCommit, ScriptedGateway, TestCatalog, child, children_of, find, root,
};

/// Three siblings under `P` ranked 0, 1, 2.
fn siblings() -> Vec<categories::category::Category> {
    vec![
        root("P", 0),
        child("x", "P", 0),
        child("y", "P", 1),
        child("z", "P", 2),
    ]
}

#[tokio::test]
async fn dispatched_messages_reorder_siblings() {
    let gateway = Arc::new(ScriptedGateway::new(siblings()));
    let mut coordinator = Coordinator::hydrate(Arc::clone(&gateway))
        .await
        .expect("hydrate");

    coordinator
        .dispatch(GestureEvent::BeginDrag {
            node_id: "z".to_string(),
        })
        .expect("begin");
    coordinator
        .dispatch(GestureEvent::Hover {
            target_id: "x".to_string(),
            position: DropPosition::Before,
        })
        .expect("hover");
    let outcome = coordinator.dispatch(GestureEvent::Drop).expect("drop");

    let DropOutcome::Committing { updates } = outcome else {
        panic!("expected a commit, got {outcome:?}");
    };
    assert_eq!(updates.len(), 3);
    assert!(
        updates
            .iter()
            .all(|update| update.parent_id.as_deref() == Some("P"))
    );

    assert_eq!(
        coordinator.settle().await.expect("settle"),
        CommitOutcome::Committed { updates: 3 }
    );
    assert_eq!(children_of(&gateway.remote(), Some("P")), vec!["z", "x", "y"]);
    assert_eq!(gateway.received(), vec![updates]);
}

#[tokio::test]
async fn rejected_commit_reloads_latest_remote() {
    let gateway = Arc::new(ScriptedGateway::new(siblings()));
    gateway.script([ScriptedCommit::Reject("stale write".to_string())]);
    let mut coordinator = Coordinator::hydrate(Arc::clone(&gateway))
        .await
        .expect("hydrate");

    coordinator.begin_drag("x").expect("begin");
    coordinator.hover("z", DropPosition::After).expect("hover");
    coordinator.drop().expect("drop");
    assert_eq!(find(coordinator.snapshot(), "x").sort_order, 2);

    // Another admin added a category meanwhile; the reload shows it.
    let mut remote = siblings();
    remote.push(child("w", "P", 3));
    gateway.set_remote(remote.clone());

    let outcome = coordinator.settle().await.expect("settle");
    assert!(matches!(outcome, CommitOutcome::Reverted { .. }));
    assert_eq!(coordinator.snapshot(), remote.as_slice());
    assert_eq!(coordinator.phase(), Phase::Idle);
}

#[tokio::test]
async fn batches_are_serialized_while_committing() {
    let gateway = Arc::new(ScriptedGateway::gated(siblings()));
    let mut coordinator = Coordinator::hydrate(Arc::clone(&gateway))
        .await
        .expect("hydrate");

    coordinator.begin_drag("x").expect("begin");
    coordinator.hover("P", DropPosition::After).expect("hover");
    coordinator.drop().expect("drop");
    assert_eq!(coordinator.phase(), Phase::Committing);

    coordinator.begin_drag("y").expect("begin while committing");
    coordinator.hover("P", DropPosition::Before).expect("hover");
    assert!(matches!(
        coordinator.drop(),
        Err(CoordinatorError::CommitInFlight)
    ));

    gateway.release_commit();
    coordinator.settle().await.expect("settle");
    assert_eq!(gateway.received().len(), 1);
    assert_eq!(children_of(&gateway.remote(), None), vec!["P", "x"]);
}

#[tokio::test]
async fn file_gateway_round_trip_through_coordinator() {
    let catalog = TestCatalog::new().expect("catalog");
    let gateway = Arc::new(catalog.gateway().expect("gateway"));
    let mut coordinator = Coordinator::hydrate(Arc::clone(&gateway))
        .await
        .expect("hydrate");

    let apparel = coordinator
        .create_node(NewCategory {
            name: "Apparel".to_string(),
            ..NewCategory::default()
        })
        .await
        .expect("apparel");
    let shoes = coordinator
        .create_node(NewCategory {
            name: "Shoes".to_string(),
            description: Some("All footwear".to_string()),
            ..NewCategory::default()
        })
        .await
        .expect("shoes");

    coordinator.begin_drag(&shoes.id).expect("begin");
    coordinator
        .hover(&apparel.id, DropPosition::Inside)
        .expect("hover");
    coordinator.drop().expect("drop");
    assert!(matches!(
        coordinator.settle().await.expect("settle"),
        CommitOutcome::Committed { .. }
    ));

    let stored = gateway.list_categories().await.expect("list");
    let stored_shoes = find(&stored, &shoes.id);
    assert_eq!(stored_shoes.parent_id.as_deref(), Some(apparel.id.as_str()));
    assert_eq!(stored_shoes.sort_order, 0);
    assert_eq!(stored_shoes.description.as_deref(), Some("All footwear"));
    assert_eq!(coordinator.tree().len(), 1);
}
