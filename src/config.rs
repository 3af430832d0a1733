//! Configuration for app-updater.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the local build-metadata file shipped next to the application.
pub const DEFAULT_BUILD_CONFIG_FILENAME: &str = "app-build.json";

/// Updater configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Where the remote manifest lives: a local file path or a URL.
    pub manifest_location: String,

    /// File name of the build-metadata document.
    #[serde(default = "default_build_config_filename")]
    pub build_config_filename: String,

    /// Directory downloaded packages are written into (system temp dir if unset).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Delay between launching the Windows installer and quitting the host.
    #[serde(default = "default_windows_quit_delay")]
    pub windows_quit_delay_ms: u64,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl UpdaterConfig {
    /// Create a configuration for the given manifest location with defaults
    /// for everything else.
    #[must_use]
    pub fn new(manifest_location: impl Into<String>) -> Self {
        Self {
            manifest_location: manifest_location.into(),
            build_config_filename: default_build_config_filename(),
            download_dir: None,
            windows_quit_delay_ms: default_windows_quit_delay(),
            log_level: default_log_level(),
        }
    }

    /// Directory downloaded packages land in.
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default location of the configuration file for the CLI.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "app-updater")
            .map(|dirs| dirs.config_dir().join("updater.toml"))
    }
}

fn default_build_config_filename() -> String {
    DEFAULT_BUILD_CONFIG_FILENAME.to_string()
}

const fn default_windows_quit_delay() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}
