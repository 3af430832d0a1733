//! Streaming package download.
//!
//! Progress is reported synchronously with chunk arrival, always starting at
//! `(0, total)` and ending at `(total, total)`. A `url` that names an existing
//! local file is copied in one step, which lets a packager test an update on
//! the same machine without serving it.

use crate::error::{Error, Result};
use crate::event::{emit, UpdaterEvent, UpdaterEventsSender};
use crate::update::ResolvedUpdate;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Outcome of a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// No update has been planned; call `check_for_updates` first.
    NotReady,
    /// The package is on disk at this path.
    Downloaded(PathBuf),
}

/// Fans progress out to the caller's callback and the event channel.
struct Progress<'a, F> {
    total: u64,
    reported: u64,
    events: &'a UpdaterEventsSender,
    on_progress: &'a mut F,
}

impl<F: FnMut(u64, u64)> Progress<'_, F> {
    fn report(&mut self, loaded: u64) {
        // Clamp so an oversized body never reports past the declared size.
        let loaded = loaded.min(self.total).max(self.reported);
        self.reported = loaded;
        (self.on_progress)(loaded, self.total);
        emit(
            self.events,
            UpdaterEvent::DownloadProgress {
                loaded,
                total: self.total,
            },
        );
    }
}

/// Writes planned packages into a download directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    dest_dir: PathBuf,
    events: UpdaterEventsSender,
}

impl Downloader {
    /// Create a downloader writing into `dest_dir`.
    #[must_use]
    pub fn new(client: reqwest::Client, dest_dir: PathBuf, events: UpdaterEventsSender) -> Self {
        Self {
            client,
            dest_dir,
            events,
        }
    }

    /// Where a package with this file name will be written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Download`] if the name carries directory components.
    pub fn destination(&self, filename: &str) -> Result<PathBuf> {
        let name = Path::new(filename).file_name();
        if filename.is_empty() || name.map(Path::new) != Some(Path::new(filename)) {
            return Err(Error::Download(format!(
                "invalid package file name '{filename}'"
            )));
        }
        Ok(self.dest_dir.join(filename))
    }

    /// Download the planned package.
    ///
    /// A partially written file is removed when the transfer fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the package cannot be fetched or written.
    pub async fn download<F>(&self, update: &ResolvedUpdate, mut on_progress: F) -> Result<PathBuf>
    where
        F: FnMut(u64, u64),
    {
        let mut progress = Progress {
            total: update.size,
            reported: 0,
            events: &self.events,
            on_progress: &mut on_progress,
        };
        progress.report(0);

        let dest = self.destination(&update.filename)?;
        tokio::fs::create_dir_all(&self.dest_dir).await?;

        let source = Path::new(&update.url);
        if source.is_file() {
            if is_same_file(source, &dest).await {
                debug!("Local package already at '{}'", dest.display());
            } else {
                debug!("Copying local package '{}'", source.display());
                tokio::fs::copy(source, &dest).await?;
            }
            progress.report(update.size);
            return Ok(dest);
        }

        match self.fetch(update, &dest, &mut progress).await {
            Ok(()) => Ok(dest),
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&dest).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("Could not remove partial download '{}': {rm}", dest.display());
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch<F>(&self, update: &ResolvedUpdate, dest: &Path, progress: &mut Progress<'_, F>) -> Result<()>
    where
        F: FnMut(u64, u64),
    {
        info!("Fetching {}", update.url);
        let response = self.client.get(&update.url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "The remote update file {} does not exist (HTTP {}).",
                update.filename,
                response.status()
            )));
        }

        let file = tokio::fs::File::create(dest).await?;
        let loaded = write_chunks(response.bytes_stream(), file, progress).await?;

        if loaded != update.size {
            warn!(
                "Received {loaded} bytes for {}, manifest declared {}",
                update.filename, update.size
            );
        }
        progress.report(update.size);
        Ok(())
    }
}

/// Whether both paths resolve to the same existing file.
///
/// Copying a file onto itself truncates it to zero bytes.
async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Drain a chunk stream into `file`, reporting cumulative progress per chunk.
///
/// Returns the number of bytes written.
async fn write_chunks<S, E, F>(
    stream: S,
    mut file: tokio::fs::File,
    progress: &mut Progress<'_, F>,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    Error: From<E>,
    F: FnMut(u64, u64),
{
    futures::pin_mut!(stream);
    let mut loaded = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        loaded += chunk.len() as u64;
        progress.report(loaded);
    }

    file.flush().await?;
    Ok(loaded)
}
