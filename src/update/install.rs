//! Platform install step.
//!
//! macOS packages are zip archives unpacked over the bundle's `Contents`
//! directory, after which the host relaunches. Windows packages are installer
//! executables; the host must quit so the installer can replace locked files.

use crate::error::{Error, Result};
use crate::host::{CommandRunner, HostApp, InstallCommand};
use crate::update::{Os, ResolvedUpdate};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Program used to elevate the extraction when the bundle is not writable.
pub const ELEVATION_PROGRAM: &str = "sudo";

/// Flags passed to the Windows installer.
pub const WINDOWS_INSTALLER_ARGS: [&str; 2] = ["/VERYSILENT", "/update=true"];

/// Outcome of an install request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Nothing planned or downloaded yet.
    NotReady,
    /// The archive was unpacked in place.
    Installed {
        /// Whether the host was asked to relaunch (skipped in development).
        relaunched: bool,
    },
    /// The installer was started and the host asked to quit.
    InstallerLaunched,
}

/// The bundle `Contents` directory: two levels above the app root.
#[must_use]
pub fn mac_content_dir(app_path: &Path) -> Option<PathBuf> {
    app_path.parent()?.parent().map(Path::to_path_buf)
}

/// Whether the current user can create files in `dir`.
#[must_use]
pub fn is_writable(dir: &Path) -> bool {
    tempfile::tempfile_in(dir).is_ok()
}

/// Extraction command for a macOS archive.
#[must_use]
pub fn mac_extract_command(archive: &Path, target: &Path, writable: bool) -> InstallCommand {
    let cmd = InstallCommand::new(
        "unzip",
        [
            "-o".to_string(),
            archive.display().to_string(),
            "-d".to_string(),
            target.display().to_string(),
        ],
    );
    if writable {
        cmd
    } else {
        cmd.prefixed(ELEVATION_PROGRAM)
    }
}

/// Installs a downloaded package and hands control back to the host.
pub struct Installer<'a> {
    host: &'a dyn HostApp,
    runner: &'a dyn CommandRunner,
    quit_delay: Duration,
    development: bool,
}

impl<'a> Installer<'a> {
    /// Create an installer.
    #[must_use]
    pub fn new(
        host: &'a dyn HostApp,
        runner: &'a dyn CommandRunner,
        quit_delay: Duration,
        development: bool,
    ) -> Self {
        Self {
            host,
            runner,
            quit_delay,
            development,
        }
    }

    /// Install `package` according to the plan's target OS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Install`] if the platform step fails. The host is
    /// left running in that case.
    pub async fn install(&self, update: &ResolvedUpdate, package: &Path) -> Result<InstallOutcome> {
        match update.system {
            Os::Mac => self.install_mac(package).await,
            Os::Win => self.install_windows(package).await,
        }
    }

    async fn install_mac(&self, package: &Path) -> Result<InstallOutcome> {
        info!("Starting update on macOS.");
        let app_path = self.host.app_path();
        let target = mac_content_dir(&app_path).ok_or_else(|| {
            Error::Install(format!(
                "cannot locate bundle contents above '{}'",
                app_path.display()
            ))
        })?;

        let writable = is_writable(&target);
        if !writable {
            info!(
                "'{}' is not writable, extracting with {ELEVATION_PROGRAM}",
                target.display()
            );
        }

        let cmd = mac_extract_command(package, &target, writable);
        let output = self
            .runner
            .run(cmd.clone())
            .await
            .map_err(|e| Error::Install(format!("failed to run '{cmd}': {e}")))?;

        if !output.success {
            let err = Error::Install(format!(
                "'{cmd}' exited with status {:?}: {}",
                output.code,
                output.stderr.trim()
            ));
            warn!("Update failed: {err}");
            return Err(err);
        }
        if !output.stderr.is_empty() {
            warn!("Update failed: {}", output.stderr);
            return Err(Error::Install(output.stderr));
        }

        if self.development {
            info!(
                "Update complete. In the development environment, the application will not be restarted to avoid a loop."
            );
            return Ok(InstallOutcome::Installed { relaunched: false });
        }

        info!("Update complete, restarting the application.");
        self.host.relaunch();
        self.host.quit();
        Ok(InstallOutcome::Installed { relaunched: true })
    }

    async fn install_windows(&self, package: &Path) -> Result<InstallOutcome> {
        info!("Starting update on Windows.");
        let cmd = InstallCommand::new(package.display().to_string(), WINDOWS_INSTALLER_ARGS);

        info!("Starting the update installer.");
        self.runner
            .spawn_detached(&cmd)
            .map_err(|e| Error::Install(format!("failed to start installer '{cmd}': {e}")))?;

        tokio::time::sleep(self.quit_delay).await;
        info!("The application is quitting.");
        self.host.quit();
        Ok(InstallOutcome::InstallerLaunched)
    }
}
