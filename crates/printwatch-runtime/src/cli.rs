//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "printwatch", about = "3D printer status monitor", version)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/printwatch/config.json)
    #[arg(long, short = 'c', global = true, env = "PRINTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Values that take precedence over the config file.
#[derive(clap::Args, Debug, Default, Clone, PartialEq)]
pub struct Overrides {
    /// Backend: demo, prusalink, prusaconnect, octoprint
    #[arg(long, global = true, env = "PRINTWATCH_BACKEND")]
    pub backend: Option<String>,

    /// Printer base URL, e.g. http://192.168.1.50
    #[arg(long, global = true, env = "PRINTWATCH_URL")]
    pub url: Option<String>,

    /// Poll interval in seconds (minimum 1)
    #[arg(long, global = true, env = "PRINTWATCH_INTERVAL")]
    pub interval: Option<f64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll continuously and print every update (default)
    Watch(WatchOpts),
    /// Fetch once and print the snapshot as JSON
    Status,
    /// Validate the configuration and print the selected backend
    CheckConfig,
}

#[derive(clap::Args, Default)]
pub struct WatchOpts {
    /// Print each update as one JSON line instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// `$XDG_CONFIG_HOME/printwatch/config.json`, else `~/.config/printwatch/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
    };
    Some(base.join("printwatch").join("config.json"))
}
