//! In-memory storage for tests.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;

/// A volatile storage backend.
///
/// Holds everything in a byte vector. `sync` is a no-op; data disappears
/// with the value. Useful for unit tests and crash simulations — tests can
/// seed a backend with [`with_data`](MemoryBackend::with_data) to replay
/// torn writes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Mutex<Vec<u8>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}

impl StorageBackend for MemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.lock();
        let size = data.len() as u64;
        let start = offset as usize;
        let end = start.saturating_add(len);

        if offset > size || end > data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[start..end].to_vec())
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        let mut data = self.data.lock();
        let offset = data.len() as u64;
        data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.data.lock().len() as u64)
    }

    fn truncate(&mut self, new_len: u64) -> StorageResult<()> {
        let mut data = self.data.lock();

        if new_len > data.len() as u64 {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_len,
                size: data.len() as u64,
            });
        }

        data.truncate(new_len as usize);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read() {
        let mut backend = MemoryBackend::new();

        let offset = backend.append(b"hello").unwrap();
        assert_eq!(offset, 0);
        assert_eq!(backend.read_at(0, 5).unwrap(), b"hello");
    }

    #[test]
    fn seeded_data_is_readable() {
        let backend = MemoryBackend::with_data(vec![1, 2, 3]);
        assert_eq!(backend.len().unwrap(), 3);
        assert_eq!(backend.read_at(1, 2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn read_past_end_fails() {
        let backend = MemoryBackend::with_data(vec![0; 4]);
        assert!(matches!(
            backend.read_at(2, 4),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn truncate_drops_tail() {
        let mut backend = MemoryBackend::with_data(b"abcdef".to_vec());
        backend.truncate(2).unwrap();
        assert_eq!(backend.data(), b"ab");
    }

    #[test]
    fn truncate_beyond_end_fails() {
        let mut backend = MemoryBackend::new();
        assert!(matches!(
            backend.truncate(1),
            Err(StorageError::TruncateBeyondEnd { .. })
        ));
    }

    #[test]
    fn is_empty_reflects_len() {
        let mut backend = MemoryBackend::new();
        assert!(backend.is_empty().unwrap());
        backend.append(b"x").unwrap();
        assert!(!backend.is_empty().unwrap());
    }
}
