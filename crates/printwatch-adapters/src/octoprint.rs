//! OctoPrint `/api/job`.

use async_trait::async_trait;
use printwatch_core::normalize::{normalize_eta, percent_to_fraction};
use printwatch_core::{FetchError, PrinterStatus, StatusSnapshot, normalize_state};
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::adapter::PrinterAdapter;
use crate::http::HttpJsonClient;
use crate::wire::{JobInfo, JobProgress, Temperatures};

pub const JOB_PATH: &str = "/api/job";

/// `state` is a bare string on most versions and `{"text": ..., "flags": ...}`
/// on some.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OctoState {
    Text(String),
    Detailed { text: Option<String> },
    Other(IgnoredAny),
}

impl OctoState {
    fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Detailed { text } => text.as_deref(),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OctoJob {
    state: Option<OctoState>,
    job: Option<JobInfo>,
    progress: Option<JobProgress>,
    temperature: Option<Temperatures>,
}

/// Completion is always a percentage on OctoPrint.
pub fn translate(raw: &OctoJob) -> StatusSnapshot {
    let state = raw
        .state
        .as_ref()
        .and_then(OctoState::text)
        .map_or(PrinterStatus::Unknown, normalize_state);

    let temps = raw.temperature.as_ref();
    let mut snapshot = StatusSnapshot::new(state)
        .with_temps(temps.and_then(Temperatures::nozzle), temps.and_then(Temperatures::bed));

    if let Some(progress) = &raw.progress {
        if let Some(percent) = progress.completion {
            snapshot.set_progress(percent_to_fraction(percent));
        }
        snapshot.eta_seconds = progress.print_time_left.and_then(normalize_eta);
    }
    snapshot.job_name = raw
        .job
        .as_ref()
        .and_then(JobInfo::file_name)
        .map(str::to_string);
    snapshot
}

#[derive(Debug)]
pub struct OctoPrintAdapter {
    http: HttpJsonClient,
}

impl OctoPrintAdapter {
    pub fn new(http: HttpJsonClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PrinterAdapter for OctoPrintAdapter {
    fn name(&self) -> &'static str {
        "octoprint"
    }

    async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        let raw: OctoJob = self.http.get_json(JOB_PATH).await?;
        Ok(translate(&raw))
    }
}
