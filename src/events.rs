//! Task lifecycle events.
//!
//! The engine emits via [`EventBus::emit`]; anything interested (logging,
//! tests, future dashboards) subscribes via [`EventBus::subscribe`]. Built on
//! [`tokio::sync::broadcast`] so listeners are independent of each other.

use tokio::sync::broadcast;

use crate::scenario::TaskStatus;

/// Events that flow through the system.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// Submission accepted and scheduled.
    Accepted { task_id: String, scenario: String },
    /// Cancelled before the scenario started. No webhook follows.
    Cancelled { task_id: String },
    /// Pre-start delay elapsed; the scenario is running.
    Started { task_id: String },
    /// Scenario finished and the webhook attempt was made.
    Finished {
        task_id: String,
        status: TaskStatus,
        delivered: bool,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> &str {
        match self {
            Self::Accepted { task_id, .. }
            | Self::Cancelled { task_id }
            | Self::Started { task_id }
            | Self::Finished { task_id, .. } => task_id,
        }
    }
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<TaskEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: TaskEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that yields all
    /// future events (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
