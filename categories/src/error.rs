//! Error taxonomy for planning moves and coordinating gestures.

use thiserror::Error;

use crate::core::gesture::GestureError;

/// Message surfaced when a move would nest a category under itself.
pub const CYCLE_MESSAGE: &str = "cannot move into own descendant";

/// Errors raised by the reorder planner. Never reach the network layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Drag or target id is not present in the snapshot.
    #[error("category '{id}' not found")]
    NotFound { id: String },

    /// The move would break the forest invariant.
    #[error("{0}")]
    Validation(String),
}

impl PlanError {
    pub fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub fn cycle() -> Self {
        Self::Validation(CYCLE_MESSAGE.to_string())
    }
}

/// A gateway refused an update batch because applying it would break the
/// forest. Travels inside `anyhow::Error`; recover it with `downcast_ref`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct BatchRejected(pub String);

/// Errors surfaced by the coordinator to its caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoordinatorError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Gesture(#[from] GestureError),

    /// A reorder batch is still in flight; persistence is serialized.
    #[error("a reorder is still being saved")]
    CommitInFlight,

    /// Request rejected before reaching the gateway.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The gateway request failed.
    #[error("network error: {0:#}")]
    Network(anyhow::Error),
}

impl CoordinatorError {
    /// Returns a short message suitable for display in the admin UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Plan(PlanError::Validation(message)) => message.clone(),
            Self::Plan(PlanError::NotFound { .. }) => {
                "That category no longer exists. Reload and try again.".to_string()
            }
            Self::Gesture(_) => "Drag was interrupted.".to_string(),
            Self::CommitInFlight => "Still saving the previous move.".to_string(),
            Self::InvalidInput(message) => message.clone(),
            Self::Network(_) => "Could not reach the catalog service.".to_string(),
        }
    }

    /// True for errors that leave the snapshot untouched and need no reload.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Network(_))
    }
}
