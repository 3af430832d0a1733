//! Update session: the three public operations and the state between them.

use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::event::{create_event_channel, emit, UpdaterEvent, UpdaterEventsChannel, UpdaterEventsSender};
use crate::host::{CommandRunner, HostApp, SystemRunner};
use crate::update::build_config;
use crate::update::download::{DownloadOutcome, Downloader};
use crate::update::install::{InstallOutcome, Installer};
use crate::update::manifest::ManifestFetcher;
use crate::update::{plan, NoUpdateReason, Os, PlanResult, ResolvedUpdate};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where a session is in the check → download → install sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No update planned.
    #[default]
    Idle,
    /// An update was planned by the last check.
    Available(ResolvedUpdate),
    /// The planned update's package is on disk (`local_path` is set).
    Downloaded(ResolvedUpdate),
}

/// Process-wide update session state.
#[derive(Debug, Clone, Default)]
pub struct UpdateSession {
    state: SessionState,
    development: bool,
}

impl UpdateSession {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The active plan, if any.
    #[must_use]
    pub fn current_update(&self) -> Option<&ResolvedUpdate> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Available(update) | SessionState::Downloaded(update) => Some(update),
        }
    }

    /// Path of the downloaded package, if the download completed.
    #[must_use]
    pub fn downloaded_path(&self) -> Option<&Path> {
        match &self.state {
            SessionState::Downloaded(update) => update.local_path.as_deref(),
            _ => None,
        }
    }

    /// Whether the build metadata was found in a development layout.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.development
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.development = false;
    }
}

/// Self-update engine for a host application.
pub struct AppUpdater {
    config: UpdaterConfig,
    host: Arc<dyn HostApp>,
    runner: Arc<dyn CommandRunner>,
    client: reqwest::Client,
    os: Option<Os>,
    session: UpdateSession,
    events_tx: UpdaterEventsSender,
    events_rx: Option<UpdaterEventsChannel>,
}

impl AppUpdater {
    /// Create an updater for `host` targeting the OS this binary runs on.
    #[must_use]
    pub fn new(config: UpdaterConfig, host: Arc<dyn HostApp>) -> Self {
        let (events_tx, events_rx) = create_event_channel();
        Self {
            config,
            host,
            runner: Arc::new(SystemRunner),
            client: reqwest::Client::new(),
            os: Os::current(),
            session: UpdateSession::default(),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Override the OS whose manifest entry is consulted.
    #[must_use]
    pub fn with_os(mut self, os: Option<Os>) -> Self {
        self.os = os;
        self
    }

    /// Override how install commands are executed.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Override the HTTP client used for manifest and package retrieval.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// The session state.
    #[must_use]
    pub fn session(&self) -> &UpdateSession {
        &self.session
    }

    /// The active plan, if any.
    #[must_use]
    pub fn current_update(&self) -> Option<&ResolvedUpdate> {
        self.session.current_update()
    }

    /// Get the receiver created with the updater.
    ///
    /// Note: Can only be called once. Subsequent calls return None.
    pub fn events(&mut self) -> Option<UpdaterEventsChannel> {
        self.events_rx.take()
    }

    /// Subscribe to updater events.
    ///
    /// Each subscriber buffers [`EVENT_CHANNEL_CAPACITY`] events. Drain it
    /// while a download runs to see every progress event; draining only
    /// afterwards yields `Lagged` and the newest events.
    ///
    /// [`EVENT_CHANNEL_CAPACITY`]: crate::event::EVENT_CHANNEL_CAPACITY
    #[must_use]
    pub fn subscribe(&self) -> UpdaterEventsChannel {
        self.events_tx.subscribe()
    }

    /// Check the configured manifest for a newer build.
    ///
    /// Missing or malformed build metadata or manifest yields `None`, never
    /// an error. The previous plan is discarded either way.
    pub async fn check_for_updates(&mut self) -> Option<ResolvedUpdate> {
        emit(&self.events_tx, UpdaterEvent::CheckingForUpdate);
        info!("Checking for update");
        self.session.reset();

        let current_version = self.host.version();
        let build = match build_config::resolve(
            &self.host.app_path(),
            &self.config.build_config_filename,
        ) {
            Ok(build) => build,
            Err(e) => {
                debug!("No build identity: {e}");
                return None;
            }
        };
        self.session.development = build.development;

        let location = &self.config.manifest_location;
        let manifest = match ManifestFetcher::new(self.client.clone()).fetch(location).await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Failed to read remote configuration from '{location}': {e}");
                return None;
            }
        };

        let Some(os) = self.os else {
            info!("No update channel is published for this platform.");
            return None;
        };

        match plan(&current_version, &build.identity, &manifest, os, location) {
            PlanResult::NoUpdate(NoUpdateReason::CurrentIsLatest(info)) => {
                emit(&self.events_tx, UpdaterEvent::UpdateNotAvailable(info));
                None
            }
            PlanResult::NoUpdate(reason) => {
                debug!("No update: {reason}");
                None
            }
            PlanResult::Available(update) => {
                info!(
                    "Found version {} (url: {}).",
                    update.remote_version, update.url
                );
                emit(&self.events_tx, UpdaterEvent::UpdateAvailable(update.clone()));
                self.session.state = SessionState::Available(update.clone());
                Some(update)
            }
        }
    }

    /// Download the planned package.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails; calling again retries.
    pub async fn download_update(&mut self) -> Result<DownloadOutcome> {
        self.download_update_with_progress(|_, _| {}).await
    }

    /// Download the planned package, reporting `(loaded, total)` per chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails; calling again retries.
    pub async fn download_update_with_progress<F>(&mut self, on_progress: F) -> Result<DownloadOutcome>
    where
        F: FnMut(u64, u64),
    {
        info!("Downloading update files");
        let Some(mut update) = self.session.current_update().cloned() else {
            warn!("No updates found. Please ensure that 'check_for_updates' has been executed.");
            return Ok(DownloadOutcome::NotReady);
        };
        update.local_path = None;

        let downloader = Downloader::new(
            self.client.clone(),
            self.config.download_dir(),
            self.events_tx.clone(),
        );

        match downloader.download(&update, on_progress).await {
            Ok(path) => {
                info!("Update files downloaded: '{}'.", path.display());
                update.local_path = Some(path.clone());
                self.session.state = SessionState::Downloaded(update);
                emit(
                    &self.events_tx,
                    UpdaterEvent::UpdateDownloaded { path: path.clone() },
                );
                Ok(DownloadOutcome::Downloaded(path))
            }
            Err(e) => {
                error!("Failed to download update files: {e}.");
                emit(&self.events_tx, UpdaterEvent::error(&e));
                self.session.state = SessionState::Available(update);
                Err(e)
            }
        }
    }

    /// Install the downloaded package and hand control back to the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform install step fails; the host keeps
    /// running so the caller can report it.
    pub async fn quit_and_install(&mut self) -> Result<InstallOutcome> {
        info!("Quitting the application and installing update.");
        let update = match &self.session.state {
            SessionState::Idle => {
                warn!("No updates found. Please ensure that 'check_for_updates' has been executed.");
                return Ok(InstallOutcome::NotReady);
            }
            SessionState::Available(_) => {
                warn!("Update files not found. Please ensure that 'download_update' has been executed.");
                return Ok(InstallOutcome::NotReady);
            }
            SessionState::Downloaded(update) => update,
        };
        let Some(package) = update.local_path.as_deref() else {
            warn!("Update files not found. Please ensure that 'download_update' has been executed.");
            return Ok(InstallOutcome::NotReady);
        };

        let installer = Installer::new(
            self.host.as_ref(),
            self.runner.as_ref(),
            Duration::from_millis(self.config.windows_quit_delay_ms),
            self.session.development,
        );

        installer.install(update, package).await.map_err(|e| {
            error!("Install failed: {e}");
            emit(&self.events_tx, UpdaterEvent::error(&e));
            e
        })
    }
}
