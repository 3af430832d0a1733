//! Error types for app-updater.

/// Top-level error type for the update pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A required document (build metadata, manifest) could not be located.
    #[error("not found: {0}")]
    NotFound(String),

    /// A document was found but could not be parsed.
    #[error("malformed {what} at '{location}': {reason}")]
    Malformed {
        /// What kind of document was being read.
        what: &'static str,
        /// Where it was read from (path or URL).
        location: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Package download failed.
    #[error("download error: {0}")]
    Download(String),

    /// Install step failed.
    #[error("install error: {0}")]
    Install(String),
}

impl Error {
    /// Whether this error means "nothing there" rather than "something broken".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
