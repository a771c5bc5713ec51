//! Error taxonomy for the reconciliation core.
//!
//! Collaborator failures (catalog fetch, library scan) are fatal for the run
//! and wrap their underlying cause; per-track problems are recoverable and
//! handled locally by the driver.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The file reference does not resolve to a regular file.
    #[error("not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// In-memory access requested on a stream-backed cached file.
    #[error("file is {size} bytes, too large for an in-memory buffer (limit {limit})")]
    BufferTooLarge { size: u64, limit: u64 },

    /// Empty or malformed track identity fields.
    #[error("track has an empty {field} field")]
    InvalidTrack { field: &'static str },

    /// User abort, propagated verbatim from the library-scan collaborator.
    /// Never retried; the run ends with an empty, non-error result.
    #[error("canceled by user")]
    Canceled,

    #[error("catalog fetch failed: {0}")]
    CatalogFetch(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("library scan failed: {0}")]
    LibraryScan(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
