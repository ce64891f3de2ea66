//! WAL framing, append and tolerant read-back.

use crate::error::EngineResult;
use arbordb_storage::StorageBackend;
use parking_lot::Mutex;

/// Frame header size: a 4-byte big-endian payload length.
const HEADER_SIZE: u64 = 4;

/// A frame read back from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Offset of the frame's first header byte.
    pub offset: u64,
    /// The raw payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Offset one past this frame — the boundary a truncation after this
    /// frame would cut at.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + HEADER_SIZE + self.payload.len() as u64
    }
}

/// Appends framed payloads to a storage backend and reads them back.
///
/// The manager frames opaque payload bytes; record encoding (and
/// encryption) happens in the codec above it.
pub struct WalManager {
    backend: Mutex<Box<dyn StorageBackend>>,
}

impl WalManager {
    /// Creates a manager over `backend`.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    /// Appends one framed payload, then syncs the backend.
    ///
    /// Returns the offset the frame was written at. The sync happens
    /// before returning, so a successful append is durable.
    pub fn append(&self, payload: &[u8]) -> EngineResult<u64> {
        let mut frame = Vec::with_capacity(HEADER_SIZE as usize + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(payload);

        let mut backend = self.backend.lock();
        let offset = backend.append(&frame)?;
        backend.sync()?;
        Ok(offset)
    }

    /// Returns the current log size in bytes.
    pub fn len(&self) -> EngineResult<u64> {
        Ok(self.backend.lock().len()?)
    }

    /// Returns whether the log holds no bytes.
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Reads every complete frame from the start of the log.
    ///
    /// Stops — without error — at the first torn frame: a header shorter
    /// than 4 bytes or a length pointing past the end of the file. The
    /// caller decides where to truncate based on which frames it accepts.
    pub fn read_frames(&self) -> EngineResult<Vec<Frame>> {
        let backend = self.backend.lock();
        let size = backend.len()?;

        let mut frames = Vec::new();
        let mut offset = 0u64;
        while offset + HEADER_SIZE <= size {
            let header = backend.read_at(offset, HEADER_SIZE as usize)?;
            let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
            if offset + HEADER_SIZE + len > size {
                break;
            }
            let payload = backend.read_at(offset + HEADER_SIZE, len as usize)?;
            frames.push(Frame { offset, payload });
            offset += HEADER_SIZE + len;
        }
        Ok(frames)
    }

    /// Truncates the log to `offset` bytes, discarding everything after.
    pub fn truncate(&self, offset: u64) -> EngineResult<()> {
        self.backend.lock().truncate(offset)?;
        Ok(())
    }

    /// Empties the log. Called by the save path after the snapshot rename
    /// has completed.
    pub fn clear(&self) -> EngineResult<()> {
        self.truncate(0)
    }
}

impl std::fmt::Debug for WalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbordb_storage::MemoryBackend;

    fn manager() -> WalManager {
        WalManager::new(Box::new(MemoryBackend::new()))
    }

    #[test]
    fn append_and_read_back() {
        let wal = manager();
        wal.append(br#"{"seq":1}"#).unwrap();
        wal.append(br#"{"seq":2}"#).unwrap();

        let frames = wal.read_frames().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload, br#"{"seq":1}"#);
        assert_eq!(frames[1].payload, br#"{"seq":2}"#);
        assert_eq!(frames[0].offset, 0);
        assert_eq!(frames[1].offset, frames[0].end());
    }

    #[test]
    fn empty_log_reads_no_frames() {
        let wal = manager();
        assert!(wal.is_empty().unwrap());
        assert!(wal.read_frames().unwrap().is_empty());
    }

    #[test]
    fn torn_header_is_tolerated() {
        let wal = manager();
        wal.append(b"good").unwrap();

        // Simulate a crash after two header bytes of the next frame.
        let seeded = {
            let mut data = wal_bytes(&wal);
            data.extend_from_slice(&[0x00, 0x00]);
            WalManager::new(Box::new(MemoryBackend::with_data(data)))
        };

        let frames = seeded.read_frames().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, b"good");
    }

    #[test]
    fn torn_payload_is_tolerated() {
        let wal = manager();
        wal.append(b"good").unwrap();

        // Full header promising 100 bytes, then only 3.
        let seeded = {
            let mut data = wal_bytes(&wal);
            data.extend_from_slice(&100u32.to_be_bytes());
            data.extend_from_slice(b"abc");
            WalManager::new(Box::new(MemoryBackend::with_data(data)))
        };

        let frames = seeded.read_frames().unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn clear_empties_the_log() {
        let wal = manager();
        wal.append(b"x").unwrap();
        assert!(!wal.is_empty().unwrap());

        wal.clear().unwrap();
        assert!(wal.is_empty().unwrap());
        assert!(wal.read_frames().unwrap().is_empty());
    }

    #[test]
    fn truncate_at_frame_boundary_keeps_prefix() {
        let wal = manager();
        wal.append(b"first").unwrap();
        wal.append(b"second").unwrap();

        let frames = wal.read_frames().unwrap();
        wal.truncate(frames[0].end()).unwrap();

        let frames = wal.read_frames().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, b"first");
    }

    fn wal_bytes(wal: &WalManager) -> Vec<u8> {
        let len = wal.len().unwrap() as usize;
        wal.backend.lock().read_at(0, len).unwrap()
    }
}
