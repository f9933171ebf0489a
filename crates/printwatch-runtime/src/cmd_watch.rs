//! `printwatch watch`: run the poll engine and print every update.
//!
//! Signals while watching: SIGUSR1 polls immediately, SIGHUP reloads the
//! config file and swaps the backend, Ctrl-C or SIGTERM stops.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use printwatch_adapters::{CredentialStore, EnvCredentials, create_adapter};
use printwatch_core::display::summary_lines;
use printwatch_core::{FailureKind, StatusSnapshot};
use printwatch_engine::{EngineConfig, PollEngine, StatusUpdate};
use serde::Serialize;
use tokio::signal::unix::{SignalKind, signal};

use crate::cli::{Overrides, WatchOpts};
use crate::config;

/// One line of `--json` output.
#[derive(Serialize)]
struct UpdateLine<'a> {
    #[serde(flatten)]
    snapshot: &'a StatusSnapshot,
    failure: Option<FailureKind>,
}

/// Entry point for `printwatch watch`.
pub async fn cmd_watch(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    opts: WatchOpts,
) -> anyhow::Result<()> {
    let credentials: Arc<dyn CredentialStore> = Arc::new(EnvCredentials);
    let app_config = config::resolve(config_path.as_deref(), &overrides);
    let adapter =
        create_adapter(&app_config, Arc::clone(&credentials)).context("invalid configuration")?;

    tracing::info!(
        backend = adapter.name(),
        interval_s = app_config.poll_interval().as_secs_f64(),
        "watching printer"
    );
    let (engine, mut updates) = PollEngine::start(adapter, EngineConfig::from_app(&app_config));

    let mut sigusr1 =
        signal(SignalKind::user_defined1()).context("failed to install SIGUSR1 handler")?;
    let mut sighup =
        signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else {
                    tracing::warn!("poll engine stopped unexpectedly");
                    break;
                };
                println!("{}", render_update(&update, opts.json, Utc::now())?);
            }
            _ = sigusr1.recv() => {
                tracing::info!("received SIGUSR1, polling now");
                engine.poll_now();
            }
            _ = sighup.recv() => {
                tracing::info!("received SIGHUP, reloading configuration");
                reload(&engine, config_path.as_deref(), &overrides, &credentials);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received ctrl-c, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down");
                break;
            }
        }
    }

    engine.stop().await;
    Ok(())
}

/// Rebuild the adapter from the current file and hand it to the engine.
/// Returns `false` when the factory rejects the config; the running backend
/// is then left untouched.
fn reload(
    engine: &PollEngine,
    config_path: Option<&Path>,
    overrides: &Overrides,
    credentials: &Arc<dyn CredentialStore>,
) -> bool {
    let app_config = config::resolve(config_path, overrides);
    match create_adapter(&app_config, Arc::clone(credentials)) {
        Ok(adapter) => {
            tracing::info!(backend = adapter.name(), "configuration reloaded");
            // The swap arms the new backend's first fetch with the current interval.
            engine.set_interval(app_config.poll_interval());
            engine.swap_adapter(adapter);
            true
        }
        Err(e) => {
            tracing::warn!("reloaded configuration rejected, keeping current backend: {e}");
            false
        }
    }
}

fn render_update(update: &StatusUpdate, json: bool, now: DateTime<Utc>) -> anyhow::Result<String> {
    if json {
        let line = UpdateLine {
            snapshot: &update.snapshot,
            failure: update.failure,
        };
        return Ok(serde_json::to_string(&line)?);
    }
    let mut out = format!("[{}]", now.format("%H:%M:%S"));
    for line in summary_lines(&update.snapshot, now) {
        out.push_str("\n  ");
        out.push_str(&line);
    }
    Ok(out)
}
