//! Error types for the ArborDB engine.

use arbordb_storage::StorageError;
use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in engine operations.
///
/// Every variant is `Clone` so a save cycle's outcome can be handed to all
/// coalesced waiters; variants therefore carry rendered messages instead of
/// source errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Rendered description of the underlying failure.
        message: String,
    },

    /// The snapshot or a WAL payload is not valid JSON.
    #[error("invalid document syntax: {message}")]
    SyntaxInvalid {
        /// Parser diagnostic.
        message: String,
    },

    /// The canonical file does not exist.
    #[error("file missing: {path}")]
    FileMissing {
        /// The path that was expected to exist.
        path: String,
    },

    /// The canonical filename resolves outside the working directory.
    #[error("path escapes the working directory: {path}")]
    PathEscape {
        /// The offending filename.
        path: String,
    },

    /// The encryption key is not exactly 32 bytes.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    BadKeyLength {
        /// Required key size.
        expected: usize,
        /// Provided key size.
        actual: usize,
    },

    /// Authenticated decryption failed; the store must be treated as
    /// unusable with this key.
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The advisory lock could not be acquired at open time.
    #[error("store is locked: {message}")]
    LockUnavailable {
        /// Description of the contention.
        message: String,
    },

    /// The advisory lock was lost or contended during a save cycle.
    /// Transient; the next cycle retries.
    #[error("lock contention: {message}")]
    LockContention {
        /// Description of the contention.
        message: String,
    },

    /// A path segment does not fit the container it addresses.
    #[error("path type mismatch at '{path}': {message}")]
    PathTypeMismatch {
        /// The full path of the failing operation.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// A WAL append or snapshot write failed; the mutation was not applied.
    #[error("durability failure: {message}")]
    DurabilityFailed {
        /// Description of the failure.
        message: String,
    },

    /// Inserting a value into a unique index would produce two locators
    /// for the same value.
    #[error("unique index violation on '{index}': value {value} already present")]
    UniqueIndexViolation {
        /// Name of the violated index.
        index: String,
        /// Canonical JSON encoding of the duplicated value.
        value: String,
    },

    /// The configured validator rejected the candidate root.
    #[error("validation failed: {}", issues.join("; "))]
    ValidationFailed {
        /// Issues reported by the validator.
        issues: Vec<String>,
    },

    /// The transaction callback produced no new root.
    #[error("transaction aborted: callback returned no root")]
    TransactionAborted,

    /// The engine failed to initialize and rejects all operations.
    #[error("engine is unusable after unrecoverable initialization failure")]
    EngineUnusable,

    /// The engine has been closed.
    #[error("engine is closed")]
    EngineClosed,
}

impl EngineError {
    /// Creates a syntax error.
    pub fn syntax_invalid(message: impl Into<String>) -> Self {
        Self::SyntaxInvalid {
            message: message.into(),
        }
    }

    /// Creates a decryption failure.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an encryption failure.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a path type mismatch error.
    pub fn path_type_mismatch(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PathTypeMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a durability failure.
    pub fn durability_failed(message: impl Into<String>) -> Self {
        Self::DurabilityFailed {
            message: message.into(),
        }
    }

    /// Creates a unique index violation.
    pub fn unique_index_violation(index: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UniqueIndexViolation {
            index: index.into(),
            value: value.into(),
        }
    }

    /// Creates a lock unavailable error.
    pub fn lock_unavailable(message: impl Into<String>) -> Self {
        Self::LockUnavailable {
            message: message.into(),
        }
    }

    /// Creates a lock contention error.
    pub fn lock_contention(message: impl Into<String>) -> Self {
        Self::LockContention {
            message: message.into(),
        }
    }

    /// Returns the stable kind tag carried by error events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::Io { .. } => "io",
            Self::SyntaxInvalid { .. } => "syntax_invalid",
            Self::FileMissing { .. } => "file_missing",
            Self::PathEscape { .. } => "path_escape",
            Self::BadKeyLength { .. } => "bad_key_length",
            Self::DecryptionFailed { .. } => "decryption_failed",
            Self::EncryptionFailed { .. } => "encryption_failed",
            Self::LockUnavailable { .. } => "lock_unavailable",
            Self::LockContention { .. } => "lock_contention",
            Self::PathTypeMismatch { .. } => "path_type_mismatch",
            Self::DurabilityFailed { .. } => "durability_failed",
            Self::UniqueIndexViolation { .. } => "unique_index_violation",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::TransactionAborted => "transaction_aborted",
            Self::EngineUnusable => "engine_unusable",
            Self::EngineClosed => "engine_closed",
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(EngineError::TransactionAborted.kind(), "transaction_aborted");
        assert_eq!(
            EngineError::unique_index_violation("user-email", "\"a@b\"").kind(),
            "unique_index_violation"
        );
    }

    #[test]
    fn messages_carry_context() {
        let err = EngineError::path_type_mismatch("users.0", "non-numeric segment");
        assert!(err.to_string().contains("users.0"));

        let err = EngineError::ValidationFailed {
            issues: vec!["missing field".into(), "bad type".into()],
        };
        assert!(err.to_string().contains("missing field; bad type"));
    }

    #[test]
    fn io_errors_convert() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = EngineError::from(io);
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("denied"));
    }
}
