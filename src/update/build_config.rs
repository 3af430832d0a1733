//! Installed build identity.
//!
//! The packager drops a small JSON document next to the application code
//! describing the runtime it was built against. Where that document lives
//! depends on how the application is laid out on disk:
//!
//! - development: `<app_root>/app-build.json`
//! - packaged, unarchived: `<app_root>/../app-build.json`
//! - packaged, archived (`app_root` is a file): `<dirname(app_root)>/app-build.json`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CPU architecture a build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit x86.
    X64,
    /// 64-bit ARM.
    Arm64,
    /// 32-bit x86.
    X86,
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
        })
    }
}

/// Identity of the locally installed build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIdentity {
    /// Bundled runtime version.
    #[serde(rename = "electron")]
    pub runtime_version: String,
    /// Packaging build id.
    #[serde(rename = "build")]
    pub build_id: String,
    /// CPU architecture.
    pub arch: Arch,
}

/// A build identity together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBuild {
    /// The parsed identity.
    pub identity: BuildIdentity,
    /// Path the metadata was read from.
    pub path: PathBuf,
    /// Whether the metadata sat directly inside the app root.
    pub development: bool,
}

/// Find the build-metadata file for an application root.
///
/// Returns the path and whether it indicates a development layout.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the app root is missing or no candidate exists.
pub fn locate(app_path: &Path, filename: &str) -> Result<(PathBuf, bool)> {
    let meta = std::fs::metadata(app_path).map_err(|e| {
        Error::NotFound(format!("app root '{}': {e}", app_path.display()))
    })?;

    if meta.is_dir() {
        let candidate = app_path.join(filename);
        if candidate.is_file() {
            info!(
                "Development environment, build config path is '{}'.",
                candidate.display()
            );
            return Ok((candidate, true));
        }
        if let Some(parent) = app_path.parent() {
            let candidate = parent.join(filename);
            if candidate.is_file() {
                info!(
                    "Production environment, build config path is '{}'.",
                    candidate.display()
                );
                return Ok((candidate, false));
            }
        }
    } else if let Some(parent) = app_path.parent() {
        let candidate = parent.join(filename);
        if candidate.is_file() {
            info!(
                "Production environment, build config path is '{}'.",
                candidate.display()
            );
            return Ok((candidate, false));
        }
    }

    warn!("Build configuration file not found.");
    Err(Error::NotFound(format!(
        "'{filename}' for app root '{}'",
        app_path.display()
    )))
}

/// Read a build-metadata document.
///
/// # Errors
///
/// Returns [`Error::Io`] if it cannot be read and [`Error::Malformed`] if it
/// does not parse.
pub fn load(path: &Path) -> Result<BuildIdentity> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::Malformed {
        what: "build config",
        location: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Resolve the installed build's identity.
///
/// A malformed document at the first matching location is final; other
/// candidate locations are not consulted.
///
/// # Errors
///
/// Returns an error if no document is found or the found one is unreadable.
pub fn resolve(app_path: &Path, filename: &str) -> Result<ResolvedBuild> {
    let (path, development) = locate(app_path, filename)?;
    let identity = load(&path).map_err(|e| {
        warn!("Build configuration file is broken: {e}");
        e
    })?;

    Ok(ResolvedBuild {
        identity,
        path,
        development,
    })
}
