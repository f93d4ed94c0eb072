//! `healthdash-tui` -- live terminal dashboard for a health-check API.
//!
//! Built on [ratatui](https://ratatui.rs) on top of `healthdash-core`'s
//! [`Controller`](healthdash_core::Controller): the controller owns polling,
//! auto-refresh and environment switching, the app only maps keys to
//! controller calls and redraws whenever the view changes.
//!
//! Logs go to a file (default `/tmp/healthdash-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod event;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use healthdash_core::{Controller, DashboardConfig};

use crate::app::App;

/// Terminal dashboard for service health.
#[derive(Parser, Debug)]
#[command(name = "healthdash-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "HEALTHDASH_PROFILE")]
    profile: Option<String>,

    /// Health API root URL (overrides profile)
    #[arg(short = 'u', long, env = "HEALTHDASH_API_URL")]
    api_url: Option<String>,

    /// Start with auto-refresh off
    #[arg(long)]
    no_auto_refresh: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/healthdash-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. The returned guard must outlive the app so buffered
/// lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "healthdash_tui={log_level},healthdash_core={log_level},healthdash_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("healthdash-tui.log"));

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

    guard
}

/// Profile from the shared config file, then flag overrides.
fn build_config(cli: &Cli) -> Result<DashboardConfig> {
    let cfg = healthdash_config::load_config().wrap_err("failed to load configuration")?;
    let (name, mut profile) = cfg.resolve_profile(cli.profile.as_deref())?;
    if let Some(ref url) = cli.api_url {
        profile.api_url.clone_from(url);
    }
    if cli.no_auto_refresh {
        profile.auto_refresh = Some(false);
    }

    let config = healthdash_config::profile_to_dashboard_config(&profile, &cfg.defaults)
        .wrap_err_with(|| format!("profile '{name}' is not usable"))?;
    info!(profile = %name, api_url = %config.api_url, "resolved profile");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);
    info!("starting healthdash-tui");

    let config = build_config(&cli)?;
    let controller = Controller::from_config(config)?;

    let mut app = App::new(controller);
    app.run().await?;

    Ok(())
}
