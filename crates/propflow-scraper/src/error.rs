//! Error taxonomy for the extraction pipeline.
//!
//! Propagation policy: browser-level failures (element not found, bounded
//! waits expiring) are transient and absorbed by [`crate::retry::retry`] up
//! to its attempt budget before escalating. Linked-entry failures never
//! leave the linked loop; record failures become the record's `error`
//! field. Only `SessionEstablishment` and `SearchRun` are fatal.

use propflow_browser::BrowserError;
use thiserror::Error;

/// Errors produced by the extraction pipeline.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A browser interaction failed
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Tab-open detection exhausted its polling attempts
    #[error("no new surface appeared after {attempts} attempts")]
    NoNewSurface {
        /// Number of polling attempts made
        attempts: u32,
    },

    /// The authenticated session could not be established; fatal
    #[error("session establishment failed: {0}")]
    SessionEstablishment(String),

    /// A whole search run failed; fatal for the remaining searches
    #[error("search run '{name}' failed: {reason}")]
    SearchRun {
        /// Saved search display name
        name: String,
        /// Underlying failure description
        reason: String,
    },

    /// Writing the aggregate result document failed
    #[error("failed to persist results to {path}: {source}")]
    Persistence {
        /// Destination path
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Serializing the aggregate result document failed
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias using [`ScrapeError`].
pub type Result<T> = std::result::Result<T, ScrapeError>;
