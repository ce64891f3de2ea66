//! Storage backend trait.

use crate::error::StorageResult;

/// An opaque, append-oriented byte store.
///
/// Backends store bytes; the engine owns every format decision. The
/// contract the write-ahead log relies on:
///
/// - `append` returns the offset the data landed at
/// - `read_at` returns exactly the bytes previously appended there
/// - after `sync` returns, all appended data survives process death
/// - `truncate` discards everything at and past the given offset
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::StorageError::ReadPastEnd`] when the range is
    /// not fully inside the store, or with an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` and returns the offset it was written at.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Forces all appended data (and metadata) to durable storage.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the store size in bytes — the offset of the next append.
    fn len(&self) -> StorageResult<u64>;

    /// Returns whether the store is empty.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Truncates the store to `new_len` bytes, discarding the tail.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::StorageError::TruncateBeyondEnd`] when
    /// `new_len` exceeds the current size.
    fn truncate(&mut self, new_len: u64) -> StorageResult<()>;
}
