//! Project-wide constants.

use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of concurrent tasks advertised by `/health`.
pub const DEFAULT_CAPACITY: usize = 10;

/// How long the `timeout` scenario sleeps, in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 30;

/// Delay between acceptance and execution. Non-zero so an immediate
/// cancel request can land before the scenario starts.
pub const DEFAULT_PRE_START_DELAY_MS: u64 = 100;

/// Simulated work time for the short scenarios.
pub const DEFAULT_STEP_DELAY_MS: u64 = 2_000;

/// Simulated work time for `slow-success`.
pub const SLOW_SUCCESS_DELAY: Duration = Duration::from_secs(10);

/// Upper bound on a single webhook request.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Error code reported by the `failure` scenario.
pub const TEST_FAILURE_CODE: &str = "test_failure";
pub const TEST_FAILURE_MESSAGE: &str = "Intentional test failure for E2E testing";

/// Error code for anything that went wrong while executing a scenario.
pub const EXECUTION_ERROR_CODE: &str = "execution_error";

/// Repository used when synthesizing pull request URLs.
pub const MOCK_REPOSITORY_URL: &str = "https://github.com/mock-org/mock-repo";

/// Convert whole minutes to a [`Duration`].
pub fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}
