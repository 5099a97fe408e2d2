//! Event types for the HRS workflow
//!
//! Provides the WorkflowEvent enum and an EventBus so a presentation layer can
//! follow status transitions and player rebinds without polling.

use crate::MediaSlot;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Workflow status
///
/// Exactly one holds at a time; it is the single source of truth for which
/// inputs and actions are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Submitting,
    Regenerating,
    Ready,
    Error,
}

impl WorkflowStatus {
    /// A request is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowStatus::Submitting | WorkflowStatus::Regenerating)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Idle => write!(f, "idle"),
            WorkflowStatus::Submitting => write!(f, "submitting"),
            WorkflowStatus::Regenerating => write!(f, "regenerating"),
            WorkflowStatus::Ready => write!(f, "ready"),
            WorkflowStatus::Error => write!(f, "error"),
        }
    }
}

/// HRS event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// Workflow status changed
    StatusChanged {
        old_status: WorkflowStatus,
        new_status: WorkflowStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A media slot was rebound to a new URL (or emptied when `url` is None)
    MediaRebound {
        slot: MediaSlot,
        /// Handle of the new renderer binding, None when the slot was emptied
        handle_id: Option<Uuid>,
        url: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl WorkflowEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            WorkflowEvent::StatusChanged { .. } => "StatusChanged",
            WorkflowEvent::MediaRebound { .. } => "MediaRebound",
        }
    }
}

/// Broadcast bus for workflow events
///
/// Cheap to clone; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start losing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
