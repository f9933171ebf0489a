//! `printwatch status`: one bounded fetch, printed as JSON.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use printwatch_adapters::{EnvCredentials, PrinterAdapter, create_adapter};
use printwatch_core::{AppConfig, FetchError, PollRecord, StatusSnapshot};
use printwatch_engine::config::DEFAULT_FETCH_DEADLINE;

/// Entry point for `printwatch status`. Returns the process exit code.
pub async fn cmd_status(app_config: &AppConfig) -> i32 {
    let adapter = match create_adapter(app_config, Arc::new(EnvCredentials)) {
        Ok(adapter) => adapter,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return 2;
        }
    };

    let result = fetch_once(adapter.as_ref(), DEFAULT_FETCH_DEADLINE).await;
    let (snapshot, code) = settle(result);
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to encode snapshot: {e}");
            return 1;
        }
    }
    code
}

/// Single fetch under an outer deadline, on top of the transport timeout.
pub async fn fetch_once(
    adapter: &dyn PrinterAdapter,
    deadline: Duration,
) -> Result<StatusSnapshot, FetchError> {
    match tokio::time::timeout(deadline, adapter.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(deadline)),
    }
}

/// Snapshot to print and exit code for one fetch result.
fn settle(result: Result<StatusSnapshot, FetchError>) -> (StatusSnapshot, i32) {
    let mut record = PollRecord::new();
    match result {
        Ok(snapshot) => {
            record.record_success(Utc::now());
            (record.apply(snapshot), 0)
        }
        Err(e) => {
            eprintln!("fetch failed: {e}");
            record.record_failure(&e.to_string());
            let snapshot = StatusSnapshot::new(e.kind().snapshot_state());
            (record.apply(snapshot), 1)
        }
    }
}
