pub mod simulated;

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_PRE_START_DELAY_MS, DEFAULT_STEP_DELAY_MS, DEFAULT_TIMEOUT_MINUTES,
    SLOW_SUCCESS_DELAY, minutes,
};

/// Matches `[test:<tag>]` anywhere in a prompt. Hyphens are part of the tag
/// so `slow-success` and `ci-failure` resolve.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[test:([\w-]+)\]").expect("marker pattern is valid"));

/// The scripted outcome a mock task follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    Success,
    Failure,
    Timeout,
    SlowSuccess,
    CiFailure,
    /// A marker was present but its tag is not a known scenario.
    Unrecognized(String),
}

impl Scenario {
    /// Map a tag onto the closed scenario set, ignoring case. Unknown tags
    /// are kept as written.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failure" => Self::Failure,
            "timeout" => Self::Timeout,
            "slow-success" => Self::SlowSuccess,
            "ci-failure" => Self::CiFailure,
            _ => Self::Unrecognized(tag.to_string()),
        }
    }

    /// Wire identifier. Unrecognized tags are echoed unchanged.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::SlowSuccess => "slow-success",
            Self::CiFailure => "ci-failure",
            Self::Unrecognized(tag) => tag.as_str(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract the scenario from a prompt. No marker means `success`; the first
/// marker wins when there are several.
pub fn resolve_scenario(prompt: &str) -> Scenario {
    match MARKER.captures(prompt).and_then(|c| c.get(1)) {
        Some(tag) => Scenario::from_tag(tag.as_str()),
        None => Scenario::Success,
    }
}

/// Terminal status reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Simulated work product. Every field is optional; the `timeout` scenario
/// reports an empty object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_failed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Outcome of one scenario run. Build it with [`ScenarioResult::completed`]
/// or [`ScenarioResult::failed`] so exactly one of `result`/`error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Seconds spent executing.
    pub duration: u64,
}

impl ScenarioResult {
    pub fn completed(result: ResultDetails, duration: u64) -> Self {
        Self {
            status: TaskStatus::Completed,
            result: Some(result),
            error: None,
            duration,
        }
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>, duration: u64) -> Self {
        Self {
            status: TaskStatus::Failed,
            result: None,
            error: Some(ErrorDetails {
                code: code.into(),
                message: message.into(),
            }),
            duration,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unknown scenario: {0}")]
    Unrecognized(String),
}

/// How long each phase of a simulated task takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioTimings {
    pub pre_start_delay: Duration,
    pub step_delay: Duration,
    pub slow_delay: Duration,
    pub timeout_duration: Duration,
}

impl Default for ScenarioTimings {
    fn default() -> Self {
        Self {
            pre_start_delay: Duration::from_millis(DEFAULT_PRE_START_DELAY_MS),
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
            slow_delay: SLOW_SUCCESS_DELAY,
            timeout_duration: minutes(DEFAULT_TIMEOUT_MINUTES),
        }
    }
}

/// Runs a scenario to completion. Implementations never observe
/// cancellation; that only applies before a run starts.
#[async_trait]
pub trait ScenarioExecutor: Send + Sync {
    async fn execute(&self, scenario: &Scenario) -> Result<ScenarioResult, ScenarioError>;
}
