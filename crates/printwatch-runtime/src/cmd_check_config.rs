//! `printwatch check-config`: build the adapter without polling.

use std::path::Path;
use std::sync::Arc;

use printwatch_adapters::{EnvCredentials, create_adapter};
use printwatch_core::AppConfig;

/// Entry point for `printwatch check-config`. Returns the process exit code.
pub fn cmd_check_config(app_config: &AppConfig, path: Option<&Path>) -> i32 {
    match check(app_config) {
        Ok(line) => {
            if let Some(p) = path {
                println!("config: {}", p.display());
            }
            println!("{line}");
            0
        }
        Err(line) => {
            eprintln!("{line}");
            2
        }
    }
}

fn check(app_config: &AppConfig) -> Result<String, String> {
    let adapter = create_adapter(app_config, Arc::new(EnvCredentials))
        .map_err(|e| format!("invalid configuration: {e}"))?;
    let mut line = format!(
        "backend: {} (poll every {}s)",
        adapter.name(),
        app_config.poll_interval().as_secs_f64()
    );
    if let Some(url) = &app_config.base_url {
        line.push_str(&format!(", url: {url}"));
    }
    Ok(line)
}
