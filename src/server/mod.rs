//! HTTP surface.
//!
//! Submissions always answer 200: the dispatcher treats any non-2xx as a
//! transport failure and retries, so a semantic rejection travels inside a
//! `rejected` envelope instead.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::engine::{Capacity, SubmissionError, TaskEngine, TaskSubmission};
use crate::registry::CancelOutcome;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<TaskEngine>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(engine: Arc<TaskEngine>, shutdown: CancellationToken) -> Self {
        Self { engine, shutdown }
    }
}

/// Answer to a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitResponse {
    Accepted {
        #[serde(rename = "taskId")]
        task_id: String,
        scenario: String,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelResponse {
    task_id: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    capacity: Capacity,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tasks", post(submit_task))
        .route("/execute", post(submit_task))
        .route("/tasks/{id}", delete(cancel_task))
        .route("/health", get(health))
        .route("/admin/shutdown", post(admin_shutdown))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the state's shutdown token fires, then drain in-flight
/// requests.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// Body limit failures surface here instead of as a 413.
fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, SubmissionError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            SubmissionError::BodyTooLarge
        } else {
            SubmissionError::UnreadableBody
        }
    })
}

async fn submit_task(
    State(st): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<SubmitResponse> {
    let parsed = read_body(body).and_then(|body| TaskSubmission::parse(&body));
    let submission = match parsed {
        Ok(submission) => submission,
        Err(e) => {
            warn!(reason = %e, "submission rejected");
            return Json(SubmitResponse::Rejected {
                reason: e.to_string(),
            });
        }
    };

    let task_id = submission.task_id.clone();
    let scenario = st.engine.submit(submission);
    Json(SubmitResponse::Accepted {
        task_id,
        scenario: scenario.to_string(),
    })
}

async fn cancel_task(State(st): State<AppState>, Path(id): Path<String>) -> Response {
    match st.engine.cancel(&id) {
        CancelOutcome::Cancelled => Json(CancelResponse {
            task_id: id,
            status: "cancelled",
        })
        .into_response(),
        CancelOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("task not found: {id}") })),
        )
            .into_response(),
    }
}

async fn health(State(st): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        capacity: st.engine.health(),
    })
}

async fn admin_shutdown(State(st): State<AppState>) -> Json<serde_json::Value> {
    info!("shutdown requested via admin endpoint");
    st.shutdown.cancel();
    Json(serde_json::json!({ "status": "shutting_down" }))
}
