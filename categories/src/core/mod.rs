//! Deterministic, pure logic for the category reorder engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! snapshots and return deterministic outputs suitable for tests.

pub mod cycle_guard;
pub mod gesture;
pub mod invariants;
pub mod path;
pub mod reorder_planner;
pub mod slug;
pub mod tree_builder;
pub mod types;
