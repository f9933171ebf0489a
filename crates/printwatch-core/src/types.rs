use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::{clamp, truncate_error};

// ─── Printer Status ───────────────────────────────────────────────

/// Normalized printer state. Every backend vocabulary maps onto exactly
/// one of these variants.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterStatus {
    Idle,
    Printing,
    Paused,
    Error,
    Offline,
    #[default]
    Unknown,
}

impl PrinterStatus {
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::Printing,
        Self::Paused,
        Self::Error,
        Self::Offline,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Printing => "printing",
            Self::Paused => "paused",
            Self::Error => "error",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }

    /// Offline and error states are rendered as degraded by consumers.
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Error | Self::Offline)
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Snapshot ─────────────────────────────────────────────────────

/// Backend-independent view of the printer at one point in time.
///
/// `progress` is private so it can only enter through [`clamp`]. `last_ok`
/// and `last_error` are owned by the poll engine: whatever an adapter leaves
/// in them is overwritten by [`PollRecord::apply`] before emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: PrinterStatus,
    progress: f64,
    pub eta_seconds: Option<u64>,
    pub job_name: Option<String>,
    pub message: Option<String>,
    pub error_message: Option<String>,
    pub nozzle_temp: Option<f64>,
    pub bed_temp: Option<f64>,
    last_ok: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl StatusSnapshot {
    pub fn new(state: PrinterStatus) -> Self {
        Self {
            state,
            progress: 0.0,
            eta_seconds: None,
            job_name: None,
            message: None,
            error_message: None,
            nozzle_temp: None,
            bed_temp: None,
            last_ok: None,
            last_error: None,
        }
    }

    /// Fraction complete, always within `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn set_progress(&mut self, fraction: f64) {
        self.progress = clamp(fraction, 0.0, 1.0);
    }

    #[must_use]
    pub fn with_progress(mut self, fraction: f64) -> Self {
        self.set_progress(fraction);
        self
    }

    #[must_use]
    pub fn with_eta(mut self, eta_seconds: Option<u64>) -> Self {
        self.eta_seconds = eta_seconds;
        self
    }

    #[must_use]
    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_temps(mut self, nozzle: Option<f64>, bed: Option<f64>) -> Self {
        self.nozzle_temp = nozzle;
        self.bed_temp = bed;
        self
    }

    /// Time of the most recent successful fetch, as recorded by the engine.
    pub fn last_ok(&self) -> Option<DateTime<Utc>> {
        self.last_ok
    }

    /// Most recent failure description, as recorded by the engine.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

// ─── Poll Record ──────────────────────────────────────────────────

/// Engine-side bookkeeping for the two engine-owned snapshot fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollRecord {
    last_ok: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl PollRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_ok = Some(now);
        self.last_error = None;
    }

    /// Store a failure description, truncated for display.
    pub fn record_failure(&mut self, description: &str) {
        self.last_error = Some(truncate_error(description));
    }

    pub fn reset(&mut self) {
        self.last_ok = None;
        self.last_error = None;
    }

    pub fn last_ok(&self) -> Option<DateTime<Utc>> {
        self.last_ok
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Stamp the engine-owned fields onto a snapshot, replacing whatever
    /// the producer put there.
    #[must_use]
    pub fn apply(&self, mut snapshot: StatusSnapshot) -> StatusSnapshot {
        snapshot.last_ok = self.last_ok;
        snapshot.last_error = self.last_error.clone();
        snapshot
    }
}
