//! Error types shared by adapters, the factory and the poll engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PrinterStatus;

/// A single fetch attempt failed. Always retried through backoff.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("printer unreachable: {0}")]
    Transport(String),

    #[error("request timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("authentication failed (HTTP {status}): check printer credentials")]
    Auth { status: u16 },

    #[error("printer returned HTTP {status}")]
    Http { status: u16 },

    #[error("malformed response: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Auth { .. } => FailureKind::Auth,
            Self::Http { .. } => FailureKind::Http,
            Self::Parse(_) => FailureKind::Parse,
        }
    }
}

/// Classification carried on failure updates so consumers can tailor hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Transport,
    Timeout,
    Auth,
    Http,
    Parse,
}

impl FailureKind {
    /// State reported while this failure is current.
    ///
    /// Connectivity problems read as offline; anything the device actively
    /// answered with (rejection, server error, garbage) reads as error.
    pub fn snapshot_state(self) -> PrinterStatus {
        match self {
            Self::Transport | Self::Timeout => PrinterStatus::Offline,
            Self::Auth | Self::Http | Self::Parse => PrinterStatus::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Auth => "auth",
            Self::Http => "http",
            Self::Parse => "parse",
        }
    }
}

/// Configuration could not produce an adapter. Never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown backend '{0}' (valid: demo, prusalink, prusaconnect, octoprint)")]
    UnknownBackend(String),

    #[error("backend '{backend}' requires '{field}' to be set")]
    MissingField {
        backend: &'static str,
        field: &'static str,
    },

    #[error("base_url must be an http:// or https:// URL, got '{0}'")]
    InvalidUrl(String),

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
