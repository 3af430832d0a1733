//! Command-line interface definition.

use app_updater::{Os, UpdaterConfig};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::eyre;
use std::path::PathBuf;

/// Check for, download and install application updates.
#[derive(Parser, Debug)]
#[command(name = "app-updater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Manifest location (local path or URL); overrides the config file.
    #[arg(long, short, env = "APP_UPDATER_MANIFEST")]
    pub manifest: Option<String>,

    /// Root path of the installed application.
    #[arg(long, env = "APP_UPDATER_APP_PATH")]
    pub app_path: PathBuf,

    /// Version of the installed application.
    #[arg(long, env = "APP_UPDATER_CURRENT_VERSION")]
    pub current_version: String,

    /// Directory to download packages into.
    #[arg(long, env = "APP_UPDATER_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Manifest OS entry to use instead of the running OS.
    #[arg(long, value_enum)]
    pub os: Option<CliOs>,

    /// Command to start after a successful install.
    #[arg(long)]
    pub relaunch_command: Option<String>,

    /// Log level; overrides the config file.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Update steps, each including the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Check the manifest and print the plan.
    Check,
    /// Check, then download the planned package.
    Download,
    /// Check, download, then install.
    Install,
}

/// OS CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliOs {
    /// macOS.
    Mac,
    /// Windows.
    Win,
}

impl Cli {
    /// Build an UpdaterConfig from the config file and CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be loaded or no manifest
    /// location is configured anywhere.
    pub fn to_config(&self) -> color_eyre::Result<UpdaterConfig> {
        let file = self
            .config
            .clone()
            .or_else(|| UpdaterConfig::default_path().filter(|p| p.is_file()));

        let mut config = match (file, &self.manifest) {
            (Some(path), _) => UpdaterConfig::from_file(&path)?,
            (None, Some(manifest)) => UpdaterConfig::new(manifest.clone()),
            (None, None) => return Err(eyre!("no manifest location: pass --manifest or --config")),
        };

        if let Some(manifest) = &self.manifest {
            config.manifest_location.clone_from(manifest);
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = Some(dir.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }

        Ok(config)
    }
}

impl From<CliOs> for Os {
    fn from(os: CliOs) -> Self {
        match os {
            CliOs::Mac => Os::Mac,
            CliOs::Win => Os::Win,
        }
    }
}
