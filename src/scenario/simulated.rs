use async_trait::async_trait;
use rand::RngExt;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{
    ResultDetails, Scenario, ScenarioError, ScenarioExecutor, ScenarioResult, ScenarioTimings,
};
use crate::consts::{MOCK_REPOSITORY_URL, TEST_FAILURE_CODE, TEST_FAILURE_MESSAGE};

/// Fakes the work a real worker would do: sleeps, then reports an outcome
/// with a made-up branch and pull request. Touches nothing on disk.
pub struct SimulatedExecutor {
    timings: ScenarioTimings,
}

impl SimulatedExecutor {
    pub fn new(timings: ScenarioTimings) -> Self {
        Self { timings }
    }

    async fn simulate(&self, delay: Duration) {
        debug!(?delay, "simulating work");
        tokio::time::sleep(delay).await;
    }
}

/// Branch, PR and summary for a run that "produced" a change.
fn synthesized_change() -> ResultDetails {
    let mut rng = rand::rng();
    let suffix: u32 = rng.random();
    let pr: u16 = rng.random();
    let pr_number = 1000 + u32::from(pr) % 9000;

    ResultDetails {
        pr_url: Some(format!("{MOCK_REPOSITORY_URL}/pull/{pr_number}")),
        branch: Some(format!("mock/task-{suffix:08x}")),
        commits: Some(1),
        summary: Some("Mock task completed successfully".to_string()),
        ci_failed: None,
    }
}

#[async_trait]
impl ScenarioExecutor for SimulatedExecutor {
    async fn execute(&self, scenario: &Scenario) -> Result<ScenarioResult, ScenarioError> {
        let started = Instant::now();

        match scenario {
            Scenario::Success => {
                self.simulate(self.timings.step_delay).await;
                Ok(ScenarioResult::completed(
                    synthesized_change(),
                    started.elapsed().as_secs(),
                ))
            }
            Scenario::Failure => {
                self.simulate(self.timings.step_delay).await;
                Ok(ScenarioResult::failed(
                    TEST_FAILURE_CODE,
                    TEST_FAILURE_MESSAGE,
                    started.elapsed().as_secs(),
                ))
            }
            Scenario::Timeout => {
                self.simulate(self.timings.timeout_duration).await;
                Ok(ScenarioResult::completed(
                    ResultDetails::default(),
                    started.elapsed().as_secs(),
                ))
            }
            Scenario::SlowSuccess => {
                self.simulate(self.timings.slow_delay).await;
                Ok(ScenarioResult::completed(
                    synthesized_change(),
                    started.elapsed().as_secs(),
                ))
            }
            Scenario::CiFailure => {
                self.simulate(self.timings.step_delay).await;
                let details = ResultDetails {
                    ci_failed: Some(true),
                    ..synthesized_change()
                };
                Ok(ScenarioResult::completed(details, started.elapsed().as_secs()))
            }
            Scenario::Unrecognized(tag) => Err(ScenarioError::Unrecognized(tag.clone())),
        }
    }
}
