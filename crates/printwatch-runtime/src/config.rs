//! Config file loading.
//!
//! Loading never fails: a missing or unreadable file yields defaults, and
//! individual bad values are dropped with a warning so the rest of the file
//! still applies. Backend-specific validation is left to the adapter
//! factory.

use std::io;
use std::path::{Path, PathBuf};

use printwatch_adapters::factory::validate_base_url;
use printwatch_core::config::{
    DEFAULT_POLL_INTERVAL_S, MAX_POLL_INTERVAL_S, bound_poll_interval_s,
};
use printwatch_core::{AppConfig, ConfigError};
use serde_json::{Map, Value};

use crate::cli::{Overrides, default_config_path};

const URL_KEYS: [&str; 2] = ["base_url", "printer_base_url"];
const INTERVAL_KEYS: [&str; 2] = ["poll_interval_s", "polling_interval_seconds"];

/// Explicit path if given, else the default location.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(default_config_path)
}

/// Load the file at `path` (if any) and apply CLI overrides on top.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> AppConfig {
    let mut config = match path {
        Some(p) => load_config(p),
        None => {
            tracing::warn!("no config path could be determined, using defaults");
            AppConfig::default()
        }
    };
    apply_overrides(&mut config, overrides);
    config
}

pub fn load_config(path: &Path) -> AppConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("config file {} not found, using defaults", path.display());
            return AppConfig::default();
        }
        Err(e) => {
            tracing::warn!("failed to read {}: {e}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match parse_config(&text) {
        Ok(config) => {
            tracing::info!("loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("{e} ({}), using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Parse a config document, dropping an invalid URL or interval.
pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    let mut doc: Value = serde_json::from_str(text)
        .map_err(|e| ConfigError::Load(format!("malformed JSON: {e}")))?;
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| ConfigError::Load("top level must be a JSON object".into()))?;

    drop_invalid_urls(obj);
    drop_invalid_intervals(obj);

    let mut config: AppConfig =
        serde_json::from_value(doc).map_err(|e| ConfigError::Load(e.to_string()))?;
    config.poll_interval_s = bound_interval(config.poll_interval_s);
    Ok(config)
}

pub fn apply_overrides(config: &mut AppConfig, overrides: &Overrides) {
    if let Some(backend) = &overrides.backend {
        config.backend = backend.clone();
    }
    if let Some(url) = &overrides.url {
        config.base_url = Some(url.clone());
    }
    if let Some(interval) = overrides.interval {
        config.poll_interval_s = bound_interval(interval);
    }
}

fn bound_interval(secs: f64) -> f64 {
    if secs > MAX_POLL_INTERVAL_S {
        tracing::warn!(
            "poll interval {secs}s is above the {}s maximum, capping",
            MAX_POLL_INTERVAL_S
        );
    }
    bound_poll_interval_s(secs)
}

fn drop_invalid_urls(obj: &mut Map<String, Value>) {
    for key in URL_KEYS {
        let keep = match obj.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) if s.trim().is_empty() => false,
            Some(Value::String(s)) => match validate_base_url(s) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("{e}, ignoring");
                    false
                }
            },
            Some(other) => {
                tracing::warn!("invalid {key} in config: {other}, ignoring");
                false
            }
        };
        if !keep {
            obj.remove(key);
        }
    }
}

fn drop_invalid_intervals(obj: &mut Map<String, Value>) {
    for key in INTERVAL_KEYS {
        if let Some(value) = obj.get(key) {
            if !value.is_number() {
                tracing::warn!(
                    "invalid {key} in config: {value}, using default {}s",
                    DEFAULT_POLL_INTERVAL_S
                );
                obj.remove(key);
            }
        }
    }
}
