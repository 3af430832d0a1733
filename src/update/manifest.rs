//! Remote update manifest.

use crate::error::{Error, Result};
use crate::update::{Arch, Os};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// File name, resolved against the manifest's directory.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

/// Packages published for one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchPackageSet {
    /// Reference package offered for fresh installs.
    pub download: PackageDescriptor,
    /// Package built against the same runtime baseline.
    pub minimal: PackageDescriptor,
    /// Complete package including the runtime.
    pub full: PackageDescriptor,
}

/// The manifest entry for one OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Packaging build id of the published release.
    #[serde(rename = "build")]
    pub build_id: String,
    /// Bundled runtime version of the published release.
    #[serde(rename = "electron")]
    pub runtime_version: String,
    /// Application version.
    pub version: String,
    /// Release date as published.
    #[serde(default)]
    pub date: String,
    /// Release notes, in order.
    #[serde(rename = "releaseNotes", default)]
    pub release_notes: Option<Vec<String>>,
    /// x64 packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x64: Option<ArchPackageSet>,
    /// arm64 packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm64: Option<ArchPackageSet>,
    /// x86 packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x86: Option<ArchPackageSet>,
}

impl UpdateConfig {
    /// Packages for an architecture, if published.
    #[must_use]
    pub fn packages(&self, arch: Arch) -> Option<&ArchPackageSet> {
        match arch {
            Arch::X64 => self.x64.as_ref(),
            Arch::Arm64 => self.arm64.as_ref(),
            Arch::X86 => self.x86.as_ref(),
        }
    }

    /// The release date, if it parses.
    #[must_use]
    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        parse_release_date(&self.date)
    }
}

/// The whole manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteManifest {
    /// macOS entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<UpdateConfig>,
    /// Windows entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win: Option<UpdateConfig>,
}

impl RemoteManifest {
    /// The entry for an OS, if published.
    #[must_use]
    pub fn get(&self, os: Os) -> Option<&UpdateConfig> {
        match os {
            Os::Mac => self.mac.as_ref(),
            Os::Win => self.win.as_ref(),
        }
    }

    /// Parse a manifest from raw bytes read at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the bytes are not a valid manifest.
    pub fn from_slice(bytes: &[u8], location: &str) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Malformed {
            what: "manifest",
            location: location.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Parse a release date in any of the forms packagers emit.
#[must_use]
pub fn parse_release_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Retrieves manifests from a local path or over HTTP.
#[derive(Debug, Clone, Default)]
pub struct ManifestFetcher {
    client: reqwest::Client,
}

impl ManifestFetcher {
    /// Create a fetcher using the given HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch and parse the manifest at `location`.
    ///
    /// An existing local file always wins and the network is not consulted,
    /// even if the file fails to parse.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when `location` is neither a file nor a
    /// URL, [`Error::Http`] on transport failure and [`Error::Malformed`]
    /// when the document does not parse.
    pub async fn fetch(&self, location: &str) -> Result<RemoteManifest> {
        let path = Path::new(location);
        if path.is_file() {
            debug!("Reading manifest from local file '{location}'");
            let bytes = tokio::fs::read(path).await?;
            return RemoteManifest::from_slice(&bytes, location);
        }

        let url = reqwest::Url::parse(location)
            .map_err(|_| Error::NotFound(format!("no manifest file or URL at '{location}'")))?;

        debug!("Fetching manifest from {url}");
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        RemoteManifest::from_slice(&bytes, location)
    }
}
