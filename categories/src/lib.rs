//! Hierarchical category reorder and reparent engine.
//!
//! Categories are stored as a flat, parent-referencing list. Drag gestures
//! move one category before, after, or inside another; the engine plans the
//! move, rejects cycles, and emits the minimal update batch that keeps every
//! sibling group densely ranked. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (tree building, cycle checks,
//!   move planning, gesture transitions). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, JSON store, persistence
//!   gateway). Isolated behind [`io::gateway::CategoryGateway`] so tests can
//!   script failures.
//!
//! [`coordinator`] owns the canonical snapshot and ties the two together;
//! [`catalog`] implements the CLI commands on top of it.

pub mod catalog;
pub mod category;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
