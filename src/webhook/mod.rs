//! Signed result callbacks.
//!
//! Every finished task produces one [`WebhookPayload`], POSTed once to the
//! caller's webhook URL and signed with the caller's per-task secret. See
//! [`signing`] for the exact message format.

pub mod dispatcher;
pub mod signing;

pub use dispatcher::WebhookDispatcher;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scenario::ScenarioResult;

pub const TIMESTAMP_HEADER: &str = "X-Request-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Request-Signature";
/// Carries the pre-shared service token, independent of the per-task secret.
pub const INTERNAL_AUTH_HEADER: &str = "X-Internal-Auth";

/// Callback body: `{taskId, status, result?, error?, duration}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub task_id: String,
    #[serde(flatten)]
    pub outcome: ScenarioResult,
}

impl WebhookPayload {
    pub fn new(task_id: impl Into<String>, outcome: ScenarioResult) -> Self {
        Self {
            task_id: task_id.into(),
            outcome,
        }
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid signing key")]
    InvalidKey,

    #[error("internal auth token is not a valid header value")]
    InvalidAuthToken,

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}
