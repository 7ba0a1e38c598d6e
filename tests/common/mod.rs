#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mock_worker::engine::{EngineConfig, TaskEngine, TaskMetadata, TaskSubmission};
use mock_worker::events::TaskEvent;
use mock_worker::registry::TaskRegistry;
use mock_worker::scenario::simulated::SimulatedExecutor;
use mock_worker::scenario::{ScenarioExecutor, ScenarioTimings};
use mock_worker::server::{self, AppState};
use mock_worker::webhook::WebhookDispatcher;

pub const SECRET: &str = "per-task-secret";
pub const INTERNAL_TOKEN: &str = "internal-test-token";
pub const WAIT: Duration = Duration::from_secs(5);

/// One captured webhook request.
#[derive(Debug)]
pub struct Delivery {
    pub headers: HeaderMap,
    pub body: String,
}

impl Delivery {
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .unwrap_or_else(|| panic!("missing header {name}"))
            .to_str()
            .unwrap()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone)]
struct ReceiverState {
    tx: mpsc::UnboundedSender<Delivery>,
    status: StatusCode,
}

async fn receive(State(st): State<ReceiverState>, headers: HeaderMap, body: String) -> StatusCode {
    let _ = st.tx.send(Delivery { headers, body });
    st.status
}

/// A local stand-in for the caller's webhook endpoint.
pub struct WebhookReceiver {
    pub url: String,
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl WebhookReceiver {
    pub async fn start(status: StatusCode) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new()
            .route("/hook", post(receive))
            .with_state(ReceiverState { tx, status });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            url: format!("http://{addr}/hook"),
            rx,
        }
    }

    pub async fn next(&mut self) -> Delivery {
        tokio::time::timeout(WAIT, self.rx.recv())
            .await
            .expect("webhook not received in time")
            .expect("receiver closed")
    }

    /// Assert nothing arrives within `wait`.
    pub async fn assert_silent(&mut self, wait: Duration) {
        if let Ok(Some(delivery)) = tokio::time::timeout(wait, self.rx.recv()).await {
            panic!("unexpected webhook: {}", delivery.body);
        }
    }
}

pub fn instant_timings(pre_start_delay: Duration) -> ScenarioTimings {
    ScenarioTimings {
        pre_start_delay,
        step_delay: Duration::ZERO,
        slow_delay: Duration::ZERO,
        timeout_duration: Duration::ZERO,
    }
}

pub fn engine_with(
    executor: Arc<dyn ScenarioExecutor>,
    pre_start_delay: Duration,
) -> Arc<TaskEngine> {
    Arc::new(TaskEngine::new(
        Arc::new(TaskRegistry::new()),
        executor,
        WebhookDispatcher::new(INTERNAL_TOKEN).unwrap(),
        EngineConfig {
            capacity: 5,
            pre_start_delay,
        },
    ))
}

/// Engine with zero-length scenarios and the given pre-start delay.
pub fn engine(pre_start_delay: Duration) -> Arc<TaskEngine> {
    let executor = Arc::new(SimulatedExecutor::new(instant_timings(pre_start_delay)));
    engine_with(executor, pre_start_delay)
}

pub fn submission(task_id: &str, prompt: &str, webhook_url: &str) -> TaskSubmission {
    TaskSubmission {
        task_id: task_id.to_string(),
        prompt: prompt.to_string(),
        webhook_url: webhook_url.to_string(),
        webhook_secret: SECRET.to_string(),
        metadata: TaskMetadata::default(),
    }
}

pub async fn next_event(rx: &mut broadcast::Receiver<TaskEvent>) -> TaskEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("no event in time")
        .expect("event bus closed")
}

/// Skip events until the terminal one (`Finished` or `Cancelled`) for `task_id`.
pub async fn wait_terminal(rx: &mut broadcast::Receiver<TaskEvent>, task_id: &str) -> TaskEvent {
    loop {
        let event = next_event(rx).await;
        if event.task_id() != task_id {
            continue;
        }
        if matches!(event, TaskEvent::Finished { .. } | TaskEvent::Cancelled { .. }) {
            return event;
        }
    }
}

pub async fn wait_started(rx: &mut broadcast::Receiver<TaskEvent>, task_id: &str) {
    loop {
        let event = next_event(rx).await;
        if matches!(&event, TaskEvent::Started { task_id: id } if id == task_id) {
            return;
        }
    }
}

/// A running HTTP server bound to an ephemeral port.
pub struct TestServer {
    pub base: String,
    pub engine: Arc<TaskEngine>,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<std::io::Result<()>>,
}

pub async fn start_server(engine: Arc<TaskEngine>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let state = AppState::new(Arc::clone(&engine), shutdown.clone());
    let handle = tokio::spawn(server::serve(listener, state));

    TestServer {
        base: format!("http://{addr}"),
        engine,
        shutdown,
        handle,
    }
}
