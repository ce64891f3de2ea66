//! Error types for storage backends.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in a storage backend.
///
/// Variants carry rendered messages rather than source errors so that the
/// engine can fan a single failure out to every waiter of a coalesced save.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// An I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Rendered description of the underlying I/O failure.
        message: String,
    },

    /// A read extended beyond the end of the store.
    #[error("read beyond end of store: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// Requested read offset.
        offset: u64,
        /// Requested read length.
        len: usize,
        /// Current store size.
        size: u64,
    },

    /// A truncation target exceeded the current size.
    #[error("cannot truncate to {requested} bytes, store holds {size}")]
    TruncateBeyondEnd {
        /// Requested new size.
        requested: u64,
        /// Current store size.
        size: u64,
    },
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
