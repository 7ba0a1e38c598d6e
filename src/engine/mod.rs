pub mod submission;

pub use submission::{SubmissionError, TaskMetadata, TaskSubmission};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::consts::{DEFAULT_CAPACITY, DEFAULT_PRE_START_DELAY_MS, EXECUTION_ERROR_CODE};
use crate::events::{EventBus, TaskEvent};
use crate::registry::{CancelOutcome, TaskRegistry};
use crate::scenario::{Scenario, ScenarioExecutor, ScenarioResult, resolve_scenario};
use crate::webhook::{WebhookDispatcher, WebhookPayload};

pub struct EngineConfig {
    /// Advertised concurrent task slots. Not enforced.
    pub capacity: usize,
    pub pre_start_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            pre_start_delay: Duration::from_millis(DEFAULT_PRE_START_DELAY_MS),
        }
    }
}

/// Point-in-time capacity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub capacity: usize,
    pub running: usize,
    pub available: usize,
}

/// Schedules accepted tasks: waits out the pre-start delay, runs the
/// scenario, sends the webhook, forgets the task.
pub struct TaskEngine {
    registry: Arc<TaskRegistry>,
    executor: Arc<dyn ScenarioExecutor>,
    webhook: WebhookDispatcher,
    events: EventBus,
    config: EngineConfig,
}

impl TaskEngine {
    pub fn new(
        registry: Arc<TaskRegistry>,
        executor: Arc<dyn ScenarioExecutor>,
        webhook: WebhookDispatcher,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            executor,
            webhook,
            events: EventBus::default(),
            config,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Accept a validated submission and schedule it. Returns immediately
    /// with the resolved scenario; the outcome arrives via webhook.
    pub fn submit(self: &Arc<Self>, submission: TaskSubmission) -> Scenario {
        let scenario = resolve_scenario(&submission.prompt);
        let token = CancellationToken::new();
        self.registry.register(&submission.task_id, token.clone());

        info!(
            task_id = %submission.task_id,
            scenario = %scenario,
            repository = ?submission.metadata.repository,
            worker_type = ?submission.metadata.worker_type,
            "task accepted"
        );
        self.events.emit(TaskEvent::Accepted {
            task_id: submission.task_id.clone(),
            scenario: scenario.to_string(),
        });

        let engine = Arc::clone(self);
        let scheduled = scenario.clone();
        tokio::spawn(async move { engine.run(submission, scheduled, token).await });

        scenario
    }

    pub fn cancel(&self, task_id: &str) -> CancelOutcome {
        let outcome = self.registry.cancel(task_id);
        match outcome {
            CancelOutcome::Cancelled => info!(task_id, "task cancelled"),
            CancelOutcome::NotFound => info!(task_id, "cancel requested for unknown task"),
        }
        outcome
    }

    pub fn health(&self) -> Capacity {
        let running = self.registry.size();
        Capacity {
            capacity: self.config.capacity,
            running,
            available: self.config.capacity.saturating_sub(running),
        }
    }

    async fn run(&self, submission: TaskSubmission, scenario: Scenario, token: CancellationToken) {
        let task_id = submission.task_id;

        // Cancellation only counts before the scenario starts.
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!(task_id = %task_id, "cancelled before start, no webhook");
                self.events.emit(TaskEvent::Cancelled { task_id });
                return;
            }
            _ = tokio::time::sleep(self.config.pre_start_delay) => {}
        }

        info!(task_id = %task_id, scenario = %scenario, "executing scenario");
        self.events.emit(TaskEvent::Started {
            task_id: task_id.clone(),
        });

        let outcome = self.execute(scenario).await;
        let status = outcome.status;
        let payload = WebhookPayload::new(task_id.clone(), outcome);
        let delivered = self
            .webhook
            .dispatch(&submission.webhook_url, &submission.webhook_secret, &payload)
            .await;

        self.registry.deregister(&task_id);
        info!(task_id = %task_id, status = status.as_str(), delivered, "task finished");
        self.events.emit(TaskEvent::Finished {
            task_id,
            status,
            delivered,
        });
    }

    /// Run the executor in its own task so an error or a panic still turns
    /// into a `failed` result.
    async fn execute(&self, scenario: Scenario) -> ScenarioResult {
        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(async move { executor.execute(&scenario).await });

        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(error = %e, "scenario could not execute");
                ScenarioResult::failed(EXECUTION_ERROR_CODE, e.to_string(), 0)
            }
            Err(e) => {
                error!(error = %e, "scenario executor crashed");
                ScenarioResult::failed(EXECUTION_ERROR_CODE, "scenario execution aborted", 0)
            }
        }
    }
}
