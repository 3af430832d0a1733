//! Updater event system.

use crate::update::{ResolvedUpdate, UpdateInfoBase};
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Events emitted by the updater.
#[derive(Debug, Clone)]
pub enum UpdaterEvent {
    /// A check has started.
    CheckingForUpdate,

    /// The installed build is already the latest.
    UpdateNotAvailable(UpdateInfoBase),

    /// A newer build was found and planned.
    UpdateAvailable(ResolvedUpdate),

    /// Download progress.
    DownloadProgress {
        /// Bytes received so far.
        loaded: u64,
        /// Expected package size.
        total: u64,
    },

    /// The package was written to disk.
    UpdateDownloaded {
        /// Local path of the package.
        path: PathBuf,
    },

    /// A download or install failed.
    Error {
        /// Short error message.
        message: String,
        /// Full diagnostic detail.
        detail: String,
    },
}

impl UpdaterEvent {
    /// Build an error event from an error value.
    #[must_use]
    pub fn error(err: &crate::Error) -> Self {
        Self::Error {
            message: err.to_string(),
            detail: format!("{err:?}"),
        }
    }
}

/// Channel for receiving updater events.
pub type UpdaterEventsChannel = broadcast::Receiver<UpdaterEvent>;

/// Sender for updater events.
pub type UpdaterEventsSender = broadcast::Sender<UpdaterEvent>;

/// Events buffered per subscriber before the oldest are dropped.
///
/// A download emits one progress event per received chunk, so a subscriber
/// that only drains after a large download finishes sees
/// `RecvError::Lagged` and loses the earliest progress events. The final
/// progress and `UpdateDownloaded` events are always retained.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (UpdaterEventsSender, UpdaterEventsChannel) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

/// Send an event, ignoring the case where nobody is listening.
pub(crate) fn emit(tx: &UpdaterEventsSender, event: UpdaterEvent) {
    let _ = tx.send(event);
}
