//! Configuration model consumed by the adapter factory and the engine.
//!
//! Field names follow the on-disk JSON document; legacy key names are
//! accepted as aliases.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_POLL_INTERVAL_S: f64 = 3.0;
pub const MIN_POLL_INTERVAL_S: f64 = 1.0;
pub const MAX_POLL_INTERVAL_S: f64 = 86_400.0;

/// Bound a configured interval to `[MIN_POLL_INTERVAL_S, MAX_POLL_INTERVAL_S]`.
/// Non-finite values give the default.
pub fn bound_poll_interval_s(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.clamp(MIN_POLL_INTERVAL_S, MAX_POLL_INTERVAL_S)
    } else {
        DEFAULT_POLL_INTERVAL_S
    }
}

// ─── Backend ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Demo,
    PrusaLink,
    PrusaConnect,
    OctoPrint,
}

impl Backend {
    pub const ALL: [Self; 4] = [
        Self::Demo,
        Self::PrusaLink,
        Self::PrusaConnect,
        Self::OctoPrint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::PrusaLink => "prusalink",
            Self::PrusaConnect => "prusaconnect",
            Self::OctoPrint => "octoprint",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "prusalink" => Ok(Self::PrusaLink),
            "prusaconnect" => Ok(Self::PrusaConnect),
            "octoprint" => Ok(Self::OctoPrint),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

// ─── Auth Mode ────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    /// Username + secret. Sent as HTTP Basic on the first request.
    Digest,
    /// Secret sent in an `X-Api-Key` header.
    ApiKey,
}

// ─── App Config ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend discriminant: "demo", "prusalink", "prusaconnect", "octoprint".
    pub backend: String,
    #[serde(alias = "printer_base_url")]
    pub base_url: Option<String>,
    #[serde(alias = "polling_interval_seconds")]
    pub poll_interval_s: f64,
    pub auth_mode: AuthMode,
    pub username: Option<String>,
    /// Lookup key handed to the credential store. Never the secret itself.
    #[serde(alias = "password_key")]
    pub credential_key: Option<String>,
    /// PrusaConnect printer identifier.
    pub printer_id: Option<String>,
    /// PrusaConnect status endpoint override.
    pub status_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Demo.as_str().to_string(),
            base_url: None,
            poll_interval_s: DEFAULT_POLL_INTERVAL_S,
            auth_mode: AuthMode::None,
            username: None,
            credential_key: None,
            printer_id: None,
            status_path: None,
        }
    }
}

impl AppConfig {
    pub fn backend_kind(&self) -> Result<Backend, ConfigError> {
        self.backend.parse()
    }

    /// Healthy polling cadence, bounded by [`bound_poll_interval_s`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(bound_poll_interval_s(self.poll_interval_s))
    }
}
