//! # app-updater
//!
//! Self-update engine for desktop applications.
//!
//! A check reads the installed build's identity from a local metadata file,
//! fetches the release manifest, and decides whether a newer build exists and
//! whether the small "minimal" package suffices or the "full" package is
//! required. The chosen package is then streamed to disk with progress and
//! handed to the platform installer, which relaunches or quits the host.
//!
//! ## Usage
//!
//! ```no_run
//! use app_updater::{AppUpdater, HostApp, UpdaterConfig};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! struct MyApp;
//!
//! impl HostApp for MyApp {
//!     fn version(&self) -> String { "1.0.0".into() }
//!     fn app_path(&self) -> PathBuf { PathBuf::from("/Applications/My.app/Contents/Resources/app") }
//!     fn relaunch(&self) {}
//!     fn quit(&self) {}
//! }
//!
//! # async fn run() -> app_updater::Result<()> {
//! let config = UpdaterConfig::new("https://updates.example.com/my-app/latest.json");
//! let mut updater = AppUpdater::new(config, Arc::new(MyApp));
//!
//! if updater.check_for_updates().await.is_some() {
//!     updater
//!         .download_update_with_progress(|loaded, total| println!("{loaded}/{total}"))
//!         .await?;
//!     updater.quit_and_install().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod update;
pub mod updater;

pub use config::UpdaterConfig;
pub use error::{Error, Result};
pub use event::{UpdaterEvent, UpdaterEventsChannel};
pub use host::{CommandOutput, CommandRunner, HostApp, InstallCommand, SystemRunner};
pub use update::{
    compare_versions, plan, DownloadOutcome, InstallOutcome, Os, PlanResult, ResolvedUpdate,
    UpdateInfoBase,
};
pub use updater::{AppUpdater, SessionState, UpdateSession};
