//! Visit countdown - days until the next visit, on a small touchscreen
//!
//! Shows the whole days remaining until a configured date. A hidden corner
//! tap code switches into set-date mode; a second code quits.
//!
//! Module structure:
//! - `domain/` - Core types (VisitDate, CornerZone, Screen)
//! - `services/` - Gesture recognition, visit store, session state machine
//! - `io/` - Display and input collaborators (terminal backend)
//! - `infra/` - Configuration

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Instant;
use time::macros::format_description;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use visit_countdown::domain::VisitDate;
use visit_countdown::infra::Config;
use visit_countdown::io::{Layout, TerminalScreen};
use visit_countdown::services::{CountdownSession, VisitDateStore};

/// Visit countdown display
#[derive(Parser, Debug)]
#[command(name = "visit-countdown", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A broken config is fatal before logging exists; only a missing one
    // falls back, and that is reported once logging is up
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let loaded = Config::load_optional(&config_path)?;
    let missing = loaded.is_none();
    let config = loaded.unwrap_or_default();

    init_logging(config.log_file())?;
    info!(git_hash = env!("GIT_HASH"), "visit-countdown starting");

    if missing {
        warn!(config_file = %config_path, "config_missing_using_defaults");
    }
    info!(
        config_file = %config.config_file(),
        visit_file = %config.visit_file(),
        width = %config.surface().width,
        height = %config.surface().height,
        sensitivity = %config.sensitivity(),
        tap_idle_ms = %config.tap_idle().as_millis(),
        set_inactivity_secs = %config.set_inactivity().as_secs(),
        "config_loaded"
    );

    // Missing file is a first run; a corrupt one stops startup untouched
    let today = VisitDate::start_of_day(Local::now().date_naive());
    let store = VisitDateStore::load_or_default(config.visit_file(), Local, today)
        .inspect_err(|e| error!(error = %e, "visit_load_failed"))?;
    info!(path = %store.path().display(), visit = %store.visit(), "visit_ready");

    let mut session = CountdownSession::new(&config, store, Instant::now());
    let layout = Layout::new(&config);
    let mut screen = TerminalScreen::new(config.surface()).context("Failed to open display")?;

    let result = session.run(&mut screen, &layout, config.frame_interval());
    drop(screen);

    if let Err(e) = &result {
        error!(error = %format!("{:#}", e), "display_loop_failed");
    }
    info!("visit-countdown finished");
    result
}

/// Structured logging to a file; stdout belongs to the display.
/// Level via RUST_LOG, default INFO.
fn init_logging(path: &str) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}
