//! Messages crossing the engine boundary.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use printwatch_adapters::PrinterAdapter;
use printwatch_core::{FailureKind, StatusSnapshot};

/// Observable scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    /// Created, first tick not yet armed.
    Idle,
    /// Timer armed for the next fetch.
    Scheduled,
    /// Exactly one fetch in flight.
    Fetching,
    /// Task has exited; no more updates will follow.
    Stopped,
}

impl EnginePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Fetching => "fetching",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer requests, applied one at a time by the engine task.
pub enum EngineCommand {
    /// Fire the timer early. Dropped while a fetch is in flight.
    PollNow,
    /// Replace the adapter, cancelling any in-flight fetch.
    Swap(Arc<dyn PrinterAdapter>),
    /// New healthy cadence, used from the next success on.
    SetInterval(Duration),
    Stop,
}

impl fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PollNow => f.write_str("PollNow"),
            Self::Swap(adapter) => f.debug_tuple("Swap").field(&adapter.name()).finish(),
            Self::SetInterval(d) => f.debug_tuple("SetInterval").field(d).finish(),
            Self::Stop => f.write_str("Stop"),
        }
    }
}

/// One completed fetch: a fresh snapshot, or a failure snapshot plus its
/// classification.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub snapshot: StatusSnapshot,
    pub failure: Option<FailureKind>,
}

impl StatusUpdate {
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
