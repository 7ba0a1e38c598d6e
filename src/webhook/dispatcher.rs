use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::{info, warn};

use super::signing::{sign, unix_now};
use super::{
    INTERNAL_AUTH_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, WebhookError, WebhookPayload,
};
use crate::consts::WEBHOOK_TIMEOUT;

/// Sends signed callbacks. One attempt per payload, no retries.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    internal_auth: HeaderValue,
}

impl WebhookDispatcher {
    /// Fails if the token cannot be sent as a header value.
    pub fn new(internal_auth_token: &str) -> Result<Self, WebhookError> {
        let mut internal_auth = HeaderValue::from_str(internal_auth_token)
            .map_err(|_| WebhookError::InvalidAuthToken)?;
        internal_auth.set_sensitive(true);

        let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            internal_auth,
        })
    }

    /// POST the payload once. Non-2xx responses are errors.
    pub async fn deliver(
        &self,
        url: &str,
        secret: &str,
        payload: &WebhookPayload,
    ) -> Result<StatusCode, WebhookError> {
        let body = serde_json::to_string(payload)?;
        let timestamp = unix_now();
        let signature = sign(secret, timestamp, &body)?;

        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(SIGNATURE_HEADER, signature)
            .header(INTERNAL_AUTH_HEADER, self.internal_auth.clone())
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(status)
    }

    /// Fire-and-forget wrapper around [`deliver`](Self::deliver): failures
    /// are logged and swallowed. Returns whether the caller acknowledged.
    pub async fn dispatch(&self, url: &str, secret: &str, payload: &WebhookPayload) -> bool {
        match self.deliver(url, secret, payload).await {
            Ok(status) => {
                info!(
                    task_id = %payload.task_id,
                    status = status.as_u16(),
                    "webhook delivered"
                );
                true
            }
            Err(WebhookError::Rejected { status, body }) => {
                warn!(
                    task_id = %payload.task_id,
                    status,
                    body = %body,
                    "webhook rejected, not retrying"
                );
                false
            }
            Err(e) => {
                warn!(task_id = %payload.task_id, error = %e, "webhook failed, not retrying");
                false
            }
        }
    }
}
