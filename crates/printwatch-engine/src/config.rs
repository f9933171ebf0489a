//! Engine timing knobs.

use std::time::Duration;

use printwatch_core::config::{MAX_POLL_INTERVAL_S, MIN_POLL_INTERVAL_S};
use printwatch_core::{AppConfig, BackoffPolicy};

/// Outer safety deadline around every adapter fetch.
pub const DEFAULT_FETCH_DEADLINE: Duration = Duration::from_secs(15);

/// Healthy cadence used when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Delay between polls while the printer answers.
    pub poll_interval: Duration,
    /// Delay schedule while it does not.
    pub backoff: BackoffPolicy,
    /// Force-cancels a fetch whose transport ignores its own timeout.
    pub fetch_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            backoff: BackoffPolicy::default(),
            fetch_deadline: DEFAULT_FETCH_DEADLINE,
        }
    }
}

impl EngineConfig {
    /// Defaults with the poll interval taken from the app config.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_fetch_deadline(mut self, deadline: Duration) -> Self {
        self.fetch_deadline = deadline;
        self
    }
}

/// Keep the poll interval between one second and one day.
pub(crate) fn bound_interval(interval: Duration) -> Duration {
    interval.clamp(
        Duration::from_secs_f64(MIN_POLL_INTERVAL_S),
        Duration::from_secs_f64(MAX_POLL_INTERVAL_S),
    )
}
