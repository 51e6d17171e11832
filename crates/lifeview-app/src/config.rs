//! Client configuration shared by the HUD and the control CLI.

use std::time::Duration;

use clap::Args;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Close to animation rate; the remote simulation free-runs between polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Where the remote simulation lives and how to talk to it.
#[derive(Debug, Clone, Args)]
pub struct ClientConfig {
    /// Base URL of the simulation service (the `/api/simulation` prefix is appended).
    #[arg(long, env = "LIFEVIEW_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Status poll cadence while the simulation view is open.
    #[arg(long, env = "LIFEVIEW_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Per-request timeout; requests wait indefinitely when unset.
    #[arg(long, env = "LIFEVIEW_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Food seeded by `start` (server default when unset).
    #[arg(long, env = "LIFEVIEW_INITIAL_FOOD")]
    pub initial_food: Option<u32>,

    /// Number of past runs the report analyses (server default when unset).
    #[arg(long, env = "LIFEVIEW_REPORT_GAMES")]
    pub report_games: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: None,
            initial_food: None,
            report_games: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("base url must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        client: ClientConfig,
    }

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn rejects_zero_interval_and_bad_scheme() {
        let config = ClientConfig {
            poll_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));

        let config = ClientConfig::with_base_url("localhost:8080");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));

        let config = ClientConfig {
            request_timeout_ms: Some(0),
            ..ClientConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroRequestTimeout));
    }

    #[test]
    fn flags_override_defaults() {
        let harness = Harness::try_parse_from([
            "lifeview",
            "--base-url",
            "http://sim.local:9000",
            "--poll-interval-ms",
            "250",
            "--request-timeout-ms",
            "1500",
            "--initial-food",
            "40",
            "--report-games",
            "5",
        ])
        .expect("flags parse");
        let config = harness.client;
        assert_eq!(config.base_url, "http://sim.local:9000");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.initial_food, Some(40));
        assert_eq!(config.report_games, Some(5));
    }
}
