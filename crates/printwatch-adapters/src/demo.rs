//! Simulated printer for trying the tool without hardware.
//!
//! Loops a 150 s cycle: printing for 120 s with progress rising linearly,
//! paused for 10 s at 75 %, then idle for 20 s. Never fails.

use std::time::Duration;

use async_trait::async_trait;
use printwatch_core::{FetchError, PrinterStatus, StatusSnapshot};
use tokio::time::Instant;

use crate::adapter::PrinterAdapter;

pub const DEMO_JOB_NAME: &str = "demo_model.gcode";

const PRINT_SECS: f64 = 120.0;
const PAUSE_SECS: f64 = 10.0;
const IDLE_SECS: f64 = 20.0;
const CYCLE_SECS: f64 = PRINT_SECS + PAUSE_SECS + IDLE_SECS;

const PAUSED_PROGRESS: f64 = 0.75;
const PAUSED_ETA_SECS: u64 = 30;
const NOZZLE_TEMP: f64 = 215.0;
const BED_TEMP: f64 = 60.0;

/// Snapshot for a point `elapsed` into the demo timeline.
pub fn demo_snapshot(elapsed: Duration) -> StatusSnapshot {
    let t = elapsed.as_secs_f64() % CYCLE_SECS;

    if t < PRINT_SECS {
        StatusSnapshot::new(PrinterStatus::Printing)
            .with_progress(t / PRINT_SECS)
            .with_eta(Some((PRINT_SECS - t) as u64))
            .with_job_name(DEMO_JOB_NAME)
            .with_temps(Some(NOZZLE_TEMP), Some(BED_TEMP))
    } else if t < PRINT_SECS + PAUSE_SECS {
        StatusSnapshot::new(PrinterStatus::Paused)
            .with_progress(PAUSED_PROGRESS)
            .with_eta(Some(PAUSED_ETA_SECS))
            .with_job_name(DEMO_JOB_NAME)
    } else {
        StatusSnapshot::new(PrinterStatus::Idle)
    }
}

/// Demo backend. The timeline starts when the adapter is created.
#[derive(Debug, Clone)]
pub struct DemoAdapter {
    origin: Instant,
}

impl DemoAdapter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(origin: Instant) -> Self {
        Self { origin }
    }

    pub fn snapshot_at(&self, now: Instant) -> StatusSnapshot {
        demo_snapshot(now.saturating_duration_since(self.origin))
    }
}

impl Default for DemoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrinterAdapter for DemoAdapter {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        Ok(self.snapshot_at(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> StatusSnapshot {
        demo_snapshot(Duration::from_secs(secs))
    }

    #[test]
    fn starts_printing_from_zero() {
        let s = at(0);
        assert_eq!(s.state, PrinterStatus::Printing);
        assert!(s.progress().abs() < f64::EPSILON);
        assert_eq!(s.eta_seconds, Some(120));
        assert_eq!(s.job_name.as_deref(), Some(DEMO_JOB_NAME));
        assert_eq!(s.nozzle_temp, Some(215.0));
        assert_eq!(s.bed_temp, Some(60.0));
    }

    #[test]
    fn progress_rises_linearly() {
        let s = at(60);
        assert!((s.progress() - 0.5).abs() < 1e-9);
        assert_eq!(s.eta_seconds, Some(60));
    }

    #[test]
    fn pauses_after_print_phase() {
        let s = at(125);
        assert_eq!(s.state, PrinterStatus::Paused);
        assert!((s.progress() - 0.75).abs() < f64::EPSILON);
        assert_eq!(s.eta_seconds, Some(30));
        assert_eq!(s.nozzle_temp, None);
    }

    #[test]
    fn idles_then_wraps() {
        assert_eq!(at(135).state, PrinterStatus::Idle);
        assert_eq!(at(149).state, PrinterStatus::Idle);
        assert_eq!(at(150).state, PrinterStatus::Printing);
        assert_eq!(at(150 * 7 + 60).state, PrinterStatus::Printing);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_follows_the_clock() {
        let adapter = DemoAdapter::new();
        let first = adapter.fetch().await.expect("demo never fails");
        assert_eq!(first.state, PrinterStatus::Printing);

        tokio::time::advance(Duration::from_secs(140)).await;
        let later = adapter.fetch().await.expect("demo never fails");
        assert_eq!(later.state, PrinterStatus::Idle);
        assert_eq!(adapter.name(), "demo");
    }
}
