use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a submission was turned away. Rendered as the `reason` of a
/// `rejected` envelope, never as an HTTP error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("missing request body")]
    MissingBody,

    #[error("invalid JSON body")]
    InvalidJson,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid webhookUrl")]
    InvalidWebhookUrl,

    #[error("request body too large")]
    BodyTooLarge,

    #[error("unreadable request body")]
    UnreadableBody,
}

/// Caller fields the mock carries along without interpreting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    pub worker_type: Option<Value>,
    pub repository: Option<Value>,
    pub base_branch: Option<Value>,
    pub linear_issue_id: Option<Value>,
    pub slug: Option<Value>,
    pub action_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubmission {
    task_id: Option<String>,
    prompt: Option<String>,
    webhook_url: Option<String>,
    webhook_secret: Option<String>,
    #[serde(flatten)]
    metadata: TaskMetadata,
}

/// A validated request to simulate a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSubmission {
    pub task_id: String,
    pub prompt: String,
    pub webhook_url: String,
    pub webhook_secret: String,
    pub metadata: TaskMetadata,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, SubmissionError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(SubmissionError::MissingField(field))
}

impl TaskSubmission {
    /// Parse and validate a raw request body. Empty strings count as missing.
    pub fn parse(body: &[u8]) -> Result<Self, SubmissionError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(SubmissionError::MissingBody);
        }

        let raw: RawSubmission = serde_json::from_slice::<Option<RawSubmission>>(body)
            .map_err(|_| SubmissionError::InvalidJson)?
            .ok_or(SubmissionError::MissingBody)?;

        let task_id = required(raw.task_id, "taskId")?;
        let prompt = required(raw.prompt, "prompt")?;
        let webhook_url = required(raw.webhook_url, "webhookUrl")?;
        let webhook_secret = required(raw.webhook_secret, "webhookSecret")?;

        match reqwest::Url::parse(&webhook_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(SubmissionError::InvalidWebhookUrl),
        }

        Ok(Self {
            task_id,
            prompt,
            webhook_url,
            webhook_secret,
            metadata: raw.metadata,
        })
    }
}
