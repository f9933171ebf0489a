//! PrusaLink local API.
//!
//! Newer firmware serves `/api/v1/status`; older firmware only the
//! OctoPrint-compatible `/api/job`. The first decisive answer pins which
//! one the adapter uses from then on.

use std::sync::OnceLock;

use async_trait::async_trait;
use printwatch_core::normalize::{normalize_eta, normalize_progress, percent_to_fraction};
use printwatch_core::{FetchError, PrinterStatus, StatusSnapshot, normalize_state};
use serde::Deserialize;

use crate::adapter::PrinterAdapter;
use crate::http::HttpJsonClient;
use crate::wire::{JobInfo, JobProgress, Temperatures};

pub const V1_STATUS_PATH: &str = "/api/v1/status";
pub const LEGACY_JOB_PATH: &str = "/api/job";

// ─── Wire formats ─────────────────────────────────────────────────

/// `/api/v1/status` body.
#[derive(Debug, Deserialize)]
pub struct V1Status {
    printer: V1Printer,
    job: Option<V1Job>,
}

#[derive(Debug, Deserialize)]
struct V1Printer {
    state: Option<String>,
    temp_nozzle: Option<f64>,
    temp_bed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct V1Job {
    /// Percent, 0..=100.
    progress: Option<f64>,
    time_remaining: Option<f64>,
    #[serde(flatten)]
    info: JobInfo,
}

/// Legacy `/api/job` body.
#[derive(Debug, Deserialize)]
pub struct LegacyJob {
    state: Option<String>,
    job: Option<JobInfo>,
    progress: Option<JobProgress>,
    temperature: Option<Temperatures>,
}

// ─── Translation ──────────────────────────────────────────────────

pub fn translate_v1(raw: &V1Status) -> StatusSnapshot {
    let state = raw
        .printer
        .state
        .as_deref()
        .map_or(PrinterStatus::Unknown, normalize_state);

    let mut snapshot = StatusSnapshot::new(state)
        .with_temps(raw.printer.temp_nozzle, raw.printer.temp_bed);

    if let Some(job) = &raw.job {
        if let Some(percent) = job.progress {
            snapshot.set_progress(percent_to_fraction(percent));
        }
        snapshot.eta_seconds = job.time_remaining.and_then(normalize_eta);
        snapshot.job_name = job.info.file_name().map(str::to_string);
    }
    snapshot
}

/// Legacy completion may be a fraction or a percentage depending on firmware.
pub fn translate_legacy(raw: &LegacyJob) -> StatusSnapshot {
    let state = raw
        .state
        .as_deref()
        .map_or(PrinterStatus::Unknown, normalize_state);

    let temps = raw.temperature.as_ref();
    let mut snapshot = StatusSnapshot::new(state)
        .with_temps(temps.and_then(Temperatures::nozzle), temps.and_then(Temperatures::bed));

    if let Some(progress) = &raw.progress {
        if let Some(completion) = progress.completion {
            snapshot.set_progress(normalize_progress(completion));
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

// ─── Adapter ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    V1,
    Legacy,
}

#[derive(Debug)]
pub struct PrusaLinkAdapter {
    http: HttpJsonClient,
    flavor: OnceLock<ApiFlavor>,
}

impl PrusaLinkAdapter {
    pub fn new(http: HttpJsonClient) -> Self {
        Self {
            http,
            flavor: OnceLock::new(),
        }
    }

    /// Endpoint family in use, once the first probe has settled it.
    pub fn flavor(&self) -> Option<ApiFlavor> {
        self.flavor.get().copied()
    }

    async fn fetch_v1(&self) -> Result<StatusSnapshot, FetchError> {
        let raw: V1Status = self.http.get_json(V1_STATUS_PATH).await?;
        Ok(translate_v1(&raw))
    }

    async fn fetch_legacy(&self) -> Result<StatusSnapshot, FetchError> {
        let raw: LegacyJob = self.http.get_json(LEGACY_JOB_PATH).await?;
        Ok(translate_legacy(&raw))
    }

    /// First contact: try v1, fall back to legacy when the device answers
    /// but v1 is missing or unreadable. Auth rejections and unreachable
    /// devices leave the question open for the next fetch.
    async fn probe(&self) -> Result<StatusSnapshot, FetchError> {
        match self.fetch_v1().await {
            Ok(snapshot) => {
                let _ = self.flavor.set(ApiFlavor::V1);
                Ok(snapshot)
            }
            Err(e @ (FetchError::Http { .. } | FetchError::Parse(_))) => {
                tracing::info!(
                    error = %e,
                    "PrusaLink v1 status unavailable, using legacy {}",
                    LEGACY_JOB_PATH
                );
                let _ = self.flavor.set(ApiFlavor::Legacy);
                self.fetch_legacy().await
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl PrinterAdapter for PrusaLinkAdapter {
    fn name(&self) -> &'static str {
        "prusalink"
    }

    async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        match self.flavor() {
            Some(ApiFlavor::V1) => self.fetch_v1().await,
            Some(ApiFlavor::Legacy) => self.fetch_legacy().await,
            None => self.probe().await,
        }
    }
}
