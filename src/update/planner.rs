//! Update plan selection.
//!
//! A minimal package is only valid on top of the exact packaging build and
//! runtime it was compiled against. Any baseline mismatch forces the full
//! package, however small the version delta.

use crate::update::version::is_newer;
use crate::update::{Arch, BuildIdentity, Os, RemoteManifest, ResolvedUpdate, UpdateInfoBase};
use tracing::info;

/// Why a check produced no update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoUpdateReason {
    /// The manifest has no entry for this OS.
    OsNotPublished(Os),
    /// The installed version is the same as or newer than the published one.
    CurrentIsLatest(UpdateInfoBase),
    /// The manifest has no packages for the installed architecture.
    ArchNotPublished {
        /// OS entry that was consulted.
        system: Os,
        /// Installed architecture.
        arch: Arch,
    },
}

impl std::fmt::Display for NoUpdateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OsNotPublished(os) => {
                write!(f, "'{os}' does not exist in the remote configuration")
            }
            Self::CurrentIsLatest(info) => write!(
                f,
                "the current version {} is the latest (remote {})",
                info.current_version, info.remote_version
            ),
            Self::ArchNotPublished { system, arch } => {
                write!(f, "no '{arch}' packages published for '{system}'")
            }
        }
    }
}

/// Outcome of planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanResult {
    /// Nothing to install.
    NoUpdate(NoUpdateReason),
    /// An update was resolved.
    Available(ResolvedUpdate),
}

/// Directory part of a manifest location, including the trailing separator.
///
/// `/` is preferred; `\` is only considered when the location has no `/`.
#[must_use]
pub fn location_directory(location: &str) -> &str {
    location
        .rfind('/')
        .or_else(|| location.rfind('\\'))
        .map_or("", |idx| &location[..=idx])
}

/// Decide what, if anything, to install.
#[must_use]
pub fn plan(
    current_version: &str,
    local: &BuildIdentity,
    manifest: &RemoteManifest,
    os: Os,
    manifest_location: &str,
) -> PlanResult {
    let Some(remote) = manifest.get(os) else {
        info!("'{os}' does not exist in the remote configuration.");
        return PlanResult::NoUpdate(NoUpdateReason::OsNotPublished(os));
    };

    if !is_newer(&remote.version, current_version) {
        info!("The current version is the latest.");
        return PlanResult::NoUpdate(NoUpdateReason::CurrentIsLatest(UpdateInfoBase {
            current_version: current_version.to_string(),
            remote_version: remote.version.clone(),
            system: os,
        }));
    }

    let Some(packages) = remote.packages(local.arch) else {
        info!("No '{}' packages published for '{os}'.", local.arch);
        return PlanResult::NoUpdate(NoUpdateReason::ArchNotPublished {
            system: os,
            arch: local.arch,
        });
    };

    let full_update =
        local.build_id != remote.build_id || local.runtime_version != remote.runtime_version;
    let package = if full_update {
        info!("A full update will be performed this time.");
        &packages.full
    } else {
        info!("A minimal update will be performed this time.");
        &packages.minimal
    };

    let url = format!(
        "{}{}",
        location_directory(manifest_location),
        package.filename
    );

    PlanResult::Available(ResolvedUpdate {
        current_version: current_version.to_string(),
        remote_version: remote.version.clone(),
        system: os,
        filename: package.filename.clone(),
        url,
        size: package.size,
        full_update,
        release_notes: remote.release_notes.clone(),
        release_date: remote.release_date(),
        local_path: None,
    })
}
