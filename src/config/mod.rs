//! Startup configuration.
//!
//! Read once from flags or environment, then handed to constructors as a
//! plain [`WorkerConfig`]. Nothing re-reads the environment later.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::consts::{
    DEFAULT_CAPACITY, DEFAULT_PORT, DEFAULT_PRE_START_DELAY_MS, DEFAULT_STEP_DELAY_MS,
    DEFAULT_TIMEOUT_MINUTES, SLOW_SUCCESS_DELAY, minutes,
};
use crate::engine::EngineConfig;
use crate::scenario::ScenarioTimings;

#[derive(Debug, Parser)]
#[command(
    name = "mock-worker",
    version,
    about = "Plays back scripted task outcomes over signed webhooks."
)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// How long the `timeout` scenario runs, in minutes
    #[arg(long, env = "MOCK_TIMEOUT_MINUTES", default_value_t = DEFAULT_TIMEOUT_MINUTES)]
    pub timeout_minutes: u64,

    /// Pre-shared token sent in the internal auth header of every webhook
    #[arg(long, env = "INTERNAL_AUTH_TOKEN", default_value = "", hide_env_values = true)]
    pub internal_auth_token: String,

    /// Task slots advertised by /health
    #[arg(long, env = "WORKER_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Delay before an accepted task starts, in milliseconds (must be > 0)
    #[arg(
        long,
        env = "MOCK_PRE_START_DELAY_MS",
        default_value_t = DEFAULT_PRE_START_DELAY_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub pre_start_delay_ms: u64,

    /// Simulated work time of the short scenarios, in milliseconds
    #[arg(long, env = "MOCK_STEP_DELAY_MS", default_value_t = DEFAULT_STEP_DELAY_MS)]
    pub step_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub listen: SocketAddr,
    pub capacity: usize,
    pub internal_auth_token: String,
    pub timings: ScenarioTimings,
}

impl WorkerConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            capacity: self.capacity,
            pre_start_delay: self.timings.pre_start_delay,
        }
    }
}

impl From<Cli> for WorkerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            listen: SocketAddr::new(cli.host, cli.port),
            capacity: cli.capacity,
            internal_auth_token: cli.internal_auth_token,
            timings: ScenarioTimings {
                pre_start_delay: Duration::from_millis(cli.pre_start_delay_ms),
                step_delay: Duration::from_millis(cli.step_delay_ms),
                slow_delay: SLOW_SUCCESS_DELAY,
                timeout_duration: minutes(cli.timeout_minutes),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("mock-worker").chain(args.iter().copied()))
    }

    #[test]
    fn flags_map_into_config() {
        let cli = parse(&[
            "--port",
            "9100",
            "--host",
            "127.0.0.1",
            "--timeout-minutes",
            "5",
            "--internal-auth-token",
            "tok",
            "--capacity",
            "3",
            "--pre-start-delay-ms",
            "250",
            "--step-delay-ms",
            "10",
        ])
        .unwrap();

        let config = WorkerConfig::from(cli);
        assert_eq!(config.listen, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.capacity, 3);
        assert_eq!(config.internal_auth_token, "tok");
        assert_eq!(config.timings.pre_start_delay, Duration::from_millis(250));
        assert_eq!(config.timings.step_delay, Duration::from_millis(10));
        assert_eq!(config.timings.timeout_duration, Duration::from_secs(300));
        assert_eq!(config.timings.slow_delay, SLOW_SUCCESS_DELAY);
    }

    #[test]
    fn zero_pre_start_delay_is_refused() {
        assert!(parse(&["--pre-start-delay-ms", "0"]).is_err());
    }

    #[test]
    fn bad_host_is_refused() {
        assert!(parse(&["--host", "not-an-ip"]).is_err());
    }

    #[test]
    fn engine_config_follows_worker_config() {
        let cli = parse(&["--capacity", "4", "--pre-start-delay-ms", "50"]).unwrap();
        let engine = WorkerConfig::from(cli).engine_config();
        assert_eq!(engine.capacity, 4);
        assert_eq!(engine.pre_start_delay, Duration::from_millis(50));
    }
}
