use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
}

/// Live, cancellable tasks keyed by task id.
///
/// A handle exists from acceptance until the task's webhook has been sent,
/// or until it is cancelled. Registering an id that is already present
/// replaces the old handle: last write wins, and the replaced task can no
/// longer be cancelled.
///
/// The lock is only held for the map operation itself, never across an
/// await point.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    handles: Mutex<HashMap<String, CancellationToken>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, task_id: &str, token: CancellationToken) {
        self.handles().insert(task_id.to_string(), token);
    }

    /// Cancel and forget a task. Only stops a task that has not started
    /// executing yet; a running scenario still finishes and reports.
    pub fn cancel(&self, task_id: &str) -> CancelOutcome {
        match self.handles().remove(task_id) {
            Some(token) => {
                token.cancel();
                CancelOutcome::Cancelled
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// Drop the handle of a finished task. No-op if it is already gone.
    pub fn deregister(&self, task_id: &str) {
        self.handles().remove(task_id);
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.handles().contains_key(task_id)
    }

    /// Number of live handles right now.
    pub fn size(&self) -> usize {
        self.handles().len()
    }
}
