//! printwatch: terminal status monitor for a single 3D printer.
//! Embeds the poll engine in-process and prints its updates.

use clap::Parser;

mod cli;
mod cmd_check_config;
mod cmd_status;
mod cmd_watch;
mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = std::env::var("PRINTWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();
    let config_path = config::config_path(args.config.as_deref());

    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Watch(cli::WatchOpts::default()));

    match command {
        cli::Command::Watch(opts) => {
            cmd_watch::cmd_watch(config_path, args.overrides, opts).await?;
        }
        cli::Command::Status => {
            let app_config = config::resolve(config_path.as_deref(), &args.overrides);
            let exit_code = cmd_status::cmd_status(&app_config).await;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        cli::Command::CheckConfig => {
            let app_config = config::resolve(config_path.as_deref(), &args.overrides);
            let exit_code =
                cmd_check_config::cmd_check_config(&app_config, config_path.as_deref());
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
