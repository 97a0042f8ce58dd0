//! Error types for mdanki-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while discovering and reading source documents.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Directory has no name to use as a deck: {}", .0.display())]
    UnnamedRoot(PathBuf),

    #[error("Walk error: {0}")]
    Walk(String),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a note store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached or the transport failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The store answered, but rejected the request.
    #[error("Anki error: {0}")]
    Remote(String),

    /// The store answered with something we could not understand.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether this failure means the store itself is unreachable.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Errors that abort a whole sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
