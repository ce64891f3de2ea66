//! Store configuration.

use crate::crypto::EncryptionKey;
use crate::index::IndexDefinition;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Validates a candidate root before it is committed.
///
/// Implementations receive the full document the store is about to adopt;
/// returning `Err` aborts the offending mutation with
/// [`ValidationFailed`](crate::EngineError::ValidationFailed) and leaves
/// the document untouched.
pub trait Validator: Send + Sync {
    /// Checks `root`; the returned issues become the error payload.
    fn validate(&self, root: &Value) -> Result<(), Vec<String>>;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Result<(), Vec<String>> + Send + Sync,
{
    fn validate(&self, root: &Value) -> Result<(), Vec<String>> {
        self(root)
    }
}

/// Configuration for opening a store.
#[derive(Clone)]
pub struct Config {
    /// AES-256 key; enables the encryption envelope for everything
    /// written to disk.
    pub(crate) key: Option<EncryptionKey>,
    /// Pretty-print plaintext snapshots with two-space indentation.
    pub(crate) indented: bool,
    /// Debounce window for snapshot writes.
    pub(crate) save_delay: Duration,
    /// Pending-queue length at which mutations are force-applied.
    pub(crate) queue_limit: usize,
    /// Secondary index definitions.
    pub(crate) indices: Vec<IndexDefinition>,
    /// Optional candidate-root validator.
    pub(crate) validator: Option<Arc<dyn Validator>>,
    /// Whether to keep a write-ahead log.
    pub(crate) use_wal: bool,
    /// Suppress tracing diagnostics.
    pub(crate) silent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key: None,
            indented: true,
            save_delay: Duration::from_millis(60),
            queue_limit: 1000,
            indices: Vec::new(),
            validator: None,
            use_wal: true,
            silent: false,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encryption key.
    #[must_use]
    pub fn key(mut self, key: EncryptionKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Sets whether plaintext snapshots are indented.
    #[must_use]
    pub const fn indented(mut self, value: bool) -> Self {
        self.indented = value;
        self
    }

    /// Sets the debounce window for snapshot writes.
    #[must_use]
    pub const fn save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = delay;
        self
    }

    /// Sets the debounce window in milliseconds.
    #[must_use]
    pub const fn save_delay_ms(self, millis: u64) -> Self {
        self.save_delay(Duration::from_millis(millis))
    }

    /// Sets the pending-queue force-apply threshold.
    #[must_use]
    pub const fn queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = limit;
        self
    }

    /// Adds a secondary index.
    #[must_use]
    pub fn index(mut self, definition: IndexDefinition) -> Self {
        self.indices.push(definition);
        self
    }

    /// Replaces the index definitions.
    #[must_use]
    pub fn indices(mut self, definitions: Vec<IndexDefinition>) -> Self {
        self.indices = definitions;
        self
    }

    /// Sets the candidate-root validator.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets whether a write-ahead log is kept.
    #[must_use]
    pub const fn use_wal(mut self, value: bool) -> Self {
        self.use_wal = value;
        self
    }

    /// Sets whether tracing diagnostics are suppressed.
    #[must_use]
    pub const fn silent(mut self, value: bool) -> Self {
        self.silent = value;
        self
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("indented", &self.indented)
            .field("save_delay", &self.save_delay)
            .field("queue_limit", &self.queue_limit)
            .field("indices", &self.indices)
            .field("validator", &self.validator.as_ref().map(|_| "dyn Validator"))
            .field("use_wal", &self.use_wal)
            .field("silent", &self.silent)
            .finish()
    }
}
