//! PrusaConnect cloud API.
//!
//! The response shape is not stable across API revisions, so the body is
//! read as loose JSON: flat (`state`, `progress`, ...), nested under
//! `printer`/`job`, or with a `temperature` block are all accepted.

use async_trait::async_trait;
use printwatch_core::normalize::{normalize_eta, normalize_progress};
use printwatch_core::{FetchError, PrinterStatus, StatusSnapshot, normalize_state};
use serde_json::{Map, Value};

use crate::adapter::PrinterAdapter;
use crate::http::HttpJsonClient;

pub const DEFAULT_STATUS_PATH: &str = "/api/v1/status";

/// Placeholder in `status_path` replaced by the configured printer id.
pub const PRINTER_ID_PLACEHOLDER: &str = "{printer_id}";

const KNOWN_FIELDS: &[&str] = &[
    "state",
    "status",
    "progress",
    "time_remaining",
    "temp_nozzle",
    "temp_bed",
    "nozzle_temp",
    "bed_temp",
    "file_name",
    "filename",
    "printer",
    "job",
    "temperature",
];

/// Request path for the status endpoint: the configured override or the
/// default, with a leading `/` and `{printer_id}` substituted.
pub fn resolve_status_path(status_path: Option<&str>, printer_id: &str) -> String {
    let path = status_path
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_STATUS_PATH)
        .replace(PRINTER_ID_PLACEHOLDER, printer_id);
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

type Object = Map<String, Value>;

fn number(obj: &Object, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_f64))
}

fn text<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

/// `{"actual": 215.0}` or a bare number.
fn reading(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    value
        .as_f64()
        .or_else(|| value.get("actual").and_then(Value::as_f64))
}

pub fn translate(data: &Value) -> Result<StatusSnapshot, FetchError> {
    let root = data
        .as_object()
        .ok_or_else(|| FetchError::Parse("expected a JSON object".into()))?;
    let printer = root.get("printer").and_then(Value::as_object);
    let job = root.get("job").and_then(Value::as_object);
    let temperature = root.get("temperature").and_then(Value::as_object);

    let state = text(root, &["state"])
        .or_else(|| printer.and_then(|p| text(p, &["state", "status"])))
        .or_else(|| text(root, &["status"]))
        .map_or(PrinterStatus::Unknown, normalize_state);

    let progress = number(root, &["progress"])
        .or_else(|| job.and_then(|j| number(j, &["progress", "completion"])));

    let eta = number(root, &["time_remaining"])
        .or_else(|| job.and_then(|j| number(j, &["time_remaining", "printTimeLeft"])));

    let nozzle = number(root, &["temp_nozzle", "nozzle_temp"])
        .or_else(|| printer.and_then(|p| number(p, &["temp_nozzle", "nozzle_temp"])))
        .or_else(|| {
            temperature.and_then(|t| reading(t.get("nozzle")).or_else(|| reading(t.get("tool0"))))
        });

    let bed = number(root, &["temp_bed", "bed_temp"])
        .or_else(|| printer.and_then(|p| number(p, &["temp_bed", "bed_temp"])))
        .or_else(|| temperature.and_then(|t| reading(t.get("bed"))));

    let job_name = text(root, &["file_name", "filename"]).or_else(|| {
        job.and_then(|j| {
            text(j, &["file_name", "filename"]).or_else(|| {
                j.get("file")
                    .and_then(Value::as_object)
                    .and_then(|f| text(f, &["name"]))
            })
        })
    });

    let unknown: Vec<&str> = root
        .keys()
        .map(String::as_str)
        .filter(|k| !KNOWN_FIELDS.contains(k))
        .collect();
    if !unknown.is_empty() {
        tracing::debug!(fields = ?unknown, "PrusaConnect response has unrecognized fields");
    }

    let mut snapshot = StatusSnapshot::new(state).with_temps(nozzle, bed);
    if let Some(p) = progress {
        snapshot.set_progress(normalize_progress(p));
    }
    snapshot.eta_seconds = eta.and_then(normalize_eta);
    snapshot.job_name = job_name.map(str::to_string);
    Ok(snapshot)
}

#[derive(Debug)]
pub struct PrusaConnectAdapter {
    http: HttpJsonClient,
    status_path: String,
}

impl PrusaConnectAdapter {
    /// `http` should carry [`AuthScheme::Bearer`](crate::http::AuthScheme::Bearer).
    pub fn new(http: HttpJsonClient, status_path: impl Into<String>) -> Self {
        Self {
            http,
            status_path: status_path.into(),
        }
    }
}

#[async_trait]
impl PrinterAdapter for PrusaConnectAdapter {
    fn name(&self) -> &'static str {
        "prusaconnect"
    }

    async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        let body: Value = self.http.get_json(&self.status_path).await?;
        translate(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_shape() {
        let s = translate(&json!({
            "state": "PRINTING",
            "progress": 45.5,
            "time_remaining": 1800,
            "temp_nozzle": 215.0,
            "temp_bed": 60.0,
            "file_name": "model.gcode"
        }))
        .expect("object");
        assert_eq!(s.state, PrinterStatus::Printing);
        assert!((s.progress() - 0.455).abs() < 1e-9);
        assert_eq!(s.eta_seconds, Some(1800));
        assert_eq!(s.nozzle_temp, Some(215.0));
        assert_eq!(s.bed_temp, Some(60.0));
        assert_eq!(s.job_name.as_deref(), Some("model.gcode"));
    }

    #[test]
    fn nested_shape() {
        let s = translate(&json!({
            "printer": {"status": "paused", "temp_nozzle": 170, "temp_bed": 55},
            "job": {"completion": 0.3, "printTimeLeft": 600, "file": {"name": "clip.gcode"}}
        }))
        .expect("object");
        assert_eq!(s.state, PrinterStatus::Paused);
        assert!((s.progress() - 0.3).abs() < 1e-9);
        assert_eq!(s.eta_seconds, Some(600));
        assert_eq!(s.nozzle_temp, Some(170.0));
        assert_eq!(s.bed_temp, Some(55.0));
        assert_eq!(s.job_name.as_deref(), Some("clip.gcode"));
    }

    #[test]
    fn temperature_block_shapes() {
        let s = translate(&json!({
            "status": "idle",
            "temperature": {"tool0": {"actual": 25.5}, "bed": 24.0}
        }))
        .expect("object");
        assert_eq!(s.state, PrinterStatus::Idle);
        assert_eq!(s.nozzle_temp, Some(25.5));
        assert_eq!(s.bed_temp, Some(24.0));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let s = translate(&json!({"state": "IDLE", "uuid": "abc", "firmware": "6.1.3"}))
            .expect("object");
        assert_eq!(s.state, PrinterStatus::Idle);
    }

    #[test]
    fn empty_object_is_unknown() {
        let s = translate(&json!({})).expect("object");
        assert_eq!(s.state, PrinterStatus::Unknown);
        assert_eq!(s.job_name, None);
    }

    #[test]
    fn non_object_is_parse_error() {
        assert!(matches!(translate(&json!([1, 2])), Err(FetchError::Parse(_))));
        assert!(matches!(translate(&json!("PRINTING")), Err(FetchError::Parse(_))));
    }

    #[test]
    fn status_path_resolution() {
        assert_eq!(resolve_status_path(None, "p1"), "/api/v1/status");
        assert_eq!(resolve_status_path(Some("  "), "p1"), "/api/v1/status");
        assert_eq!(
            resolve_status_path(Some("app/printers/{printer_id}/status"), "c0ffee"),
            "/app/printers/c0ffee/status"
        );
    }
}
