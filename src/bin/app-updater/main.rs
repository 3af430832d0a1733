//! app-updater CLI entry point.

mod cli;

use app_updater::{AppUpdater, DownloadOutcome, HostApp};
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Host backed by command-line arguments; lifecycle requests are acted on
/// once the command has finished.
struct CliHost {
    version: String,
    app_path: PathBuf,
    relaunch_command: Option<String>,
    relaunch_requested: AtomicBool,
    quit_requested: AtomicBool,
}

impl HostApp for CliHost {
    fn version(&self) -> String {
        self.version.clone()
    }

    fn app_path(&self) -> PathBuf {
        self.app_path.clone()
    }

    fn relaunch(&self) {
        self.relaunch_requested.store(true, Ordering::SeqCst);
    }

    fn quit(&self) {
        self.quit_requested.store(true, Ordering::SeqCst);
    }
}

impl CliHost {
    fn finish(&self) {
        if self.relaunch_requested.load(Ordering::SeqCst) {
            match &self.relaunch_command {
                Some(cmd) => {
                    info!("Relaunching: {cmd}");
                    if let Err(e) = std::process::Command::new(cmd).spawn() {
                        warn!("Relaunch failed: {e}");
                    }
                }
                None => info!("Relaunch requested; no --relaunch-command given"),
            }
        }
        if self.quit_requested.load(Ordering::SeqCst) {
            info!("Quit requested by installer");
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = cli.to_config()?;

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("app-updater v{}", env!("CARGO_PKG_VERSION"));

    let host = Arc::new(CliHost {
        version: cli.current_version.clone(),
        app_path: cli.app_path.clone(),
        relaunch_command: cli.relaunch_command.clone(),
        relaunch_requested: AtomicBool::new(false),
        quit_requested: AtomicBool::new(false),
    });

    let mut updater = AppUpdater::new(config, host.clone());
    if let Some(os) = cli.os {
        updater = updater.with_os(Some(os.into()));
    }

    let Some(update) = updater.check_for_updates().await else {
        println!("No update available.");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&update)?);
    if cli.command == Command::Check {
        return Ok(());
    }

    let outcome = updater
        .download_update_with_progress(|loaded, total| eprint!("\r{loaded}/{total} bytes"))
        .await?;
    eprintln!();
    if let DownloadOutcome::Downloaded(path) = &outcome {
        println!("Downloaded to {}", path.display());
    }
    if cli.command == Command::Download {
        return Ok(());
    }

    let outcome = updater.quit_and_install().await?;
    info!("Install outcome: {outcome:?}");
    host.finish();

    info!("Goodbye!");
    Ok(())
}
