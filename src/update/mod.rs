//! Update decision and execution pipeline.
//!
//! This module handles:
//! - Resolving the installed build's identity from local metadata
//! - Fetching the remote manifest (local file first, then network)
//! - Choosing between a minimal and a full package per architecture
//! - Streaming the chosen package to disk with progress
//! - Handing the package to the platform installer

pub mod build_config;
pub mod download;
pub mod install;
pub mod manifest;
pub mod planner;
pub mod version;

pub use build_config::{Arch, BuildIdentity, ResolvedBuild};
pub use download::{DownloadOutcome, Downloader};
pub use install::{InstallOutcome, Installer};
pub use manifest::{ArchPackageSet, ManifestFetcher, PackageDescriptor, RemoteManifest, UpdateConfig};
pub use planner::{plan, NoUpdateReason, PlanResult};
pub use version::compare_versions;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Operating system key used in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// macOS.
    Mac,
    /// Windows.
    Win,
}

impl Os {
    /// The manifest key for the OS this binary was compiled for, if published.
    #[must_use]
    pub const fn current() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::Mac)
        } else if cfg!(target_os = "windows") {
            Some(Self::Win)
        } else {
            None
        }
    }

    /// Manifest key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mac => "mac",
            Self::Win => "win",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a check that found nothing newer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateInfoBase {
    /// Installed version.
    pub current_version: String,
    /// Version published in the manifest.
    pub remote_version: String,
    /// OS the manifest entry was read for.
    pub system: Os,
}

/// A planned update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUpdate {
    /// Installed version.
    pub current_version: String,
    /// Version being installed.
    pub remote_version: String,
    /// OS the plan targets; decides the install branch.
    pub system: Os,
    /// Package file name.
    pub filename: String,
    /// Retrieval location (URL or local path).
    pub url: String,
    /// Expected package size in bytes.
    pub size: u64,
    /// Whether the full package was selected.
    pub full_update: bool,
    /// Release notes, in order.
    pub release_notes: Option<Vec<String>>,
    /// Release date, if the manifest's date parsed.
    pub release_date: Option<DateTime<Utc>>,
    /// Where the package was written; set after a successful download.
    pub local_path: Option<PathBuf>,
}

impl ResolvedUpdate {
    /// The not-available style summary of this plan.
    #[must_use]
    pub fn info(&self) -> UpdateInfoBase {
        UpdateInfoBase {
            current_version: self.current_version.clone(),
            remote_version: self.remote_version.clone(),
            system: self.system,
        }
    }
}
