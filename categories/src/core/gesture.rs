//! Drag gesture state machine for the category tree manager.
//!
//! Input surfaces (pointer drag, keyboard reordering, batch tools) translate
//! their raw events into [`GestureEvent`] messages. [`GestureState::apply`]
//! is pure: it returns the next state plus, on a completed drop, the move the
//! caller should plan.
//!
//! # Invariants
//!
//! 1. `Drop` and `Cancel` always return the machine to `Idle`.
//! 2. A [`DropRequest`] is only produced from `HoverTarget`.
//! 3. A drop from `Dragging` (no hover target) behaves like a cancel.

use thiserror::Error;

use crate::core::types::DropPosition;

/// Message dispatched by an input surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEvent {
    BeginDrag {
        node_id: String,
    },
    Hover {
        target_id: String,
        position: DropPosition,
    },
    Drop,
    Cancel,
}

impl GestureEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::BeginDrag { .. } => "begin_drag",
            Self::Hover { .. } => "hover",
            Self::Drop => "drop",
            Self::Cancel => "cancel",
        }
    }
}

/// Pointer-side state of a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        drag_id: String,
    },
    HoverTarget {
        drag_id: String,
        target_id: String,
        position: DropPosition,
    },
}

/// A completed drop that should be handed to the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    pub drag_id: String,
    pub target_id: String,
    pub position: DropPosition,
}

/// Event not accepted in the current state. The state is left unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot {event} while {state}")]
pub struct GestureError {
    pub event: &'static str,
    pub state: &'static str,
}

impl GestureState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging { .. } => "dragging",
            Self::HoverTarget { .. } => "hovering",
        }
    }

    /// Id of the category being dragged, if any.
    pub fn drag_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Dragging { drag_id } | Self::HoverTarget { drag_id, .. } => {
                Some(drag_id.as_str())
            }
        }
    }

    /// Compute the next state for `event`.
    pub fn apply(&self, event: GestureEvent) -> Result<(Self, Option<DropRequest>), GestureError> {
        let rejected = |event: &GestureEvent| GestureError {
            event: event.name(),
            state: self.name(),
        };

        match (self, event) {
            (_, GestureEvent::Cancel) => Ok((Self::Idle, None)),
            (Self::Idle, GestureEvent::BeginDrag { node_id }) => {
                Ok((Self::Dragging { drag_id: node_id }, None))
            }
            (
                Self::Dragging { drag_id } | Self::HoverTarget { drag_id, .. },
                GestureEvent::Hover {
                    target_id,
                    position,
                },
            ) => Ok((
                Self::HoverTarget {
                    drag_id: drag_id.clone(),
                    target_id,
                    position,
                },
                None,
            )),
            (Self::Dragging { .. }, GestureEvent::Drop) => Ok((Self::Idle, None)),
            (
                Self::HoverTarget {
                    drag_id,
                    target_id,
                    position,
                },
                GestureEvent::Drop,
            ) => Ok((
                Self::Idle,
                Some(DropRequest {
                    drag_id: drag_id.clone(),
                    target_id: target_id.clone(),
                    position: *position,
                }),
            )),
            (_, event) => Err(rejected(&event)),
        }
    }
}
