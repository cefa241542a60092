//! Kodi Headless - runs the application core without a display.
//!
//! The main loop runs on the process main thread, which owns the messenger.
//! A side thread waits for Ctrl+C or SIGTERM and asks the loop to quit.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use kodi_core::{bootstrap, ApplicationMessenger};

use crate::config::HeadlessConfig;

/// Kodi Headless - media center core without a GUI.
#[derive(Parser, Debug)]
#[command(name = "kodi-headless")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "KODI_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// User data folder (overrides config file).
    #[arg(short = 'u', long, env = "KODI_USER_DATA")]
    user_data: Option<PathBuf>,

    /// Keep user data next to the executable.
    #[arg(short, long)]
    portable: bool,

    /// Start in fullscreen mode.
    #[arg(long)]
    fullscreen: bool,

    /// Allow powering the machine down.
    #[arg(long)]
    standalone: bool,

    /// Test mode: power transitions are only logged.
    #[arg(long)]
    test: bool,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,

    /// Items to play right after startup.
    items: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Kodi Headless v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        HeadlessConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(user_data) = args.user_data {
        config.user_data = Some(user_data);
    }
    config.portable |= args.portable;
    config.standalone |= args.standalone;
    config.start_fullscreen |= args.fullscreen;

    let params = config.to_params(args.items, args.test);
    let mut context =
        bootstrap(config.settings, params).context("Failed to start the application core")?;

    log::info!("Core started, entering main loop");

    let signal_thread = spawn_signal_listener(Arc::clone(context.messenger()))
        .context("Failed to install signal handlers")?;

    let exit = context.run(args.max_frames);
    context.shutdown();
    // the listener only ever posts Quit; leave it parked
    drop(signal_thread);

    log::info!("Exiting with code {}", exit.code());
    std::process::exit(exit.code());
}

/// Posts `Quit` when Ctrl+C or SIGTERM arrives.
fn spawn_signal_listener(messenger: Arc<ApplicationMessenger>) -> Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    let handle = thread::Builder::new()
        .name("kodi-signals".into())
        .spawn(move || {
            runtime.block_on(shutdown_signal());
            log::info!("Shutdown signal received, quitting...");
            messenger.quit();
        })?;
    Ok(handle)
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
