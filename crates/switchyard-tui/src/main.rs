//! `switchyard`: terminal manager for proxy profiles.
//!
//! Each profile is shown as a card with its source, quota usage and a
//! rotating info line. Cards can be selected, refreshed (directly or via
//! the proxy), edited, inspected for their proxy chain, and deleted.
//!
//! Logs go to a file (default under the platform data dir) so they never
//! corrupt the terminal UI. A background data bridge streams profile list
//! changes from the backend into the TUI action loop.
//!
//! Entry point: CLI argument parsing, config loading, tracing setup, panic
//! hooks, and app launch.

mod action;
mod app;
mod component;
mod components;
mod data_bridge;
mod event;
mod notifier;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use switchyard_config::Config;

use crate::app::{App, AppOptions};

/// Terminal manager for switching, refreshing, and editing proxy profiles.
#[derive(Parser, Debug)]
#[command(name = "switchyard", version, about)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, env = "SWITCHYARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log file path (overrides `defaults.log_file`)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write a default config file to the config path and exit
    #[arg(long)]
    init_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may be logged to stdout/stderr while the
/// TUI owns the terminal. The returned guard flushes on drop.
fn setup_tracing(log_file: &Path, verbose: u8) -> Result<WorkerGuard> {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "switchyard={log_level},switchyard_core={log_level},switchyard_config={log_level}"
        ))
    });

    let log_dir = log_file.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(log_dir)?;
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("switchyard.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let config_path = cli.config.clone().unwrap_or_else(switchyard_config::config_path);

    if cli.init_config {
        if config_path.exists() {
            println!("config already exists at {}", config_path.display());
        } else {
            switchyard_config::save_config_to(&Config::default(), &config_path)?;
            println!("wrote {}", config_path.display());
        }
        return Ok(());
    }

    let config = switchyard_config::load_config_from(&config_path)?;

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.defaults.log_file.clone())
        .unwrap_or_else(switchyard_config::default_log_path);
    let _log_guard = setup_tracing(&log_file, cli.verbose)?;

    info!(
        config = %config_path.display(),
        profiles = config.profiles.len(),
        "starting switchyard"
    );

    let options = AppOptions {
        backend: Arc::new(config.build_backend()?),
        translator: Arc::new(config.catalog()),
        rotation_interval: config.rotation_interval()?,
        tick_rate: config.tick_rate(),
    };

    let mut app = App::new(options);
    app.run().await?;

    Ok(())
}
