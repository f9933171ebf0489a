//! Human-readable summary of a snapshot for consumers.

use chrono::{DateTime, Utc};

use crate::types::{PrinterStatus, StatusSnapshot};

/// Display width for `Last error:` lines.
const SHORT_ERROR_LEN: usize = 60;

/// Format remaining time as `1h 5m` or `4m 10s`.
pub fn format_eta(eta_seconds: u64) -> String {
    let hours = eta_seconds / 3600;
    let minutes = (eta_seconds % 3600) / 60;
    let seconds = eta_seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// Elapsed time since the last good poll, or `None` past one hour.
pub fn format_last_ok(last_ok: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    let elapsed = (now - last_ok).num_seconds().max(0);
    if elapsed < 60 {
        Some(format!("Last OK: {elapsed}s ago"))
    } else if elapsed < 3600 {
        Some(format!("Last OK: {}m ago", elapsed / 60))
    } else {
        None
    }
}

pub fn summary_lines(snapshot: &StatusSnapshot, now: DateTime<Utc>) -> Vec<String> {
    let mut lines = vec![format!("Status: {}", snapshot.state)];

    let job_active = matches!(snapshot.state, PrinterStatus::Printing | PrinterStatus::Paused);
    if job_active || snapshot.progress() > 0.0 {
        lines.push(format!("Progress: {:.1}%", snapshot.progress() * 100.0));
    }
    if let Some(eta) = snapshot.eta_seconds {
        lines.push(format!("ETA: {}", format_eta(eta)));
    }
    if let Some(job) = &snapshot.job_name {
        lines.push(format!("Job: {job}"));
    }
    if let Some(t) = snapshot.nozzle_temp {
        lines.push(format!("Nozzle: {t:.1}°C"));
    }
    if let Some(t) = snapshot.bed_temp {
        lines.push(format!("Bed: {t:.1}°C"));
    }
    if let Some(msg) = &snapshot.message {
        lines.push(format!("Info: {msg}"));
    }
    if let Some(err) = &snapshot.error_message {
        lines.push(format!("Error: {err}"));
    }
    if snapshot.state.is_degraded() {
        if let Some(err) = snapshot.last_error() {
            let short: String = err.chars().take(SHORT_ERROR_LEN).collect();
            lines.push(format!("Last error: {short}"));
        }
    }
    if let Some(line) = snapshot.last_ok().and_then(|t| format_last_ok(t, now)) {
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PollRecord;
    use chrono::Duration;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid")
            .with_timezone(&Utc)
    }

    #[test]
    fn eta_formats() {
        assert_eq!(format_eta(3900), "1h 5m");
        assert_eq!(format_eta(250), "4m 10s");
        assert_eq!(format_eta(0), "0m 0s");
    }

    #[test]
    fn last_ok_buckets() {
        let t0 = ts("2026-03-01T10:00:00Z");
        assert_eq!(
            format_last_ok(t0, t0 + Duration::seconds(12)).as_deref(),
            Some("Last OK: 12s ago")
        );
        assert_eq!(
            format_last_ok(t0, t0 + Duration::seconds(185)).as_deref(),
            Some("Last OK: 3m ago")
        );
        assert!(format_last_ok(t0, t0 + Duration::hours(2)).is_none());
    }

    #[test]
    fn printing_summary() {
        let snap = StatusSnapshot::new(PrinterStatus::Printing)
            .with_progress(0.425)
            .with_eta(Some(1847))
            .with_job_name("benchy.gcode")
            .with_temps(Some(215.0), Some(60.0));
        let lines = summary_lines(&snap, Utc::now());
        assert_eq!(
            lines,
            vec![
                "Status: printing",
                "Progress: 42.5%",
                "ETA: 30m 47s",
                "Job: benchy.gcode",
                "Nozzle: 215.0°C",
                "Bed: 60.0°C",
            ]
        );
    }

    #[test]
    fn offline_summary_shows_last_error_and_age() {
        let t0 = ts("2026-03-01T10:00:00Z");
        let mut record = PollRecord::new();
        record.record_success(t0);
        record.record_failure("printer unreachable: connection refused");

        let snap = record.apply(StatusSnapshot::new(PrinterStatus::Offline));
        let lines = summary_lines(&snap, t0 + Duration::seconds(30));
        assert!(lines.contains(&"Last error: printer unreachable: connection refused".to_string()));
        assert!(lines.contains(&"Last OK: 30s ago".to_string()));
    }

    #[test]
    fn idle_without_progress_is_terse() {
        let snap = StatusSnapshot::new(PrinterStatus::Idle);
        assert_eq!(summary_lines(&snap, Utc::now()), vec!["Status: idle"]);
    }
}
