//! # ArborDB Storage
//!
//! Byte-store backends for ArborDB.
//!
//! A [`StorageBackend`] is an opaque, append-oriented byte store. It knows
//! nothing about WAL frames, snapshots or documents — the engine owns all
//! format interpretation. Backends exist so the write-ahead log can run
//! against a real file in production and against memory in tests.
//!
//! ## Available backends
//!
//! - [`FileBackend`] — persistent storage over OS file APIs
//! - [`MemoryBackend`] — volatile storage for tests and ephemeral stores
//!
//! ```rust
//! use arbordb_storage::{MemoryBackend, StorageBackend};
//!
//! let mut backend = MemoryBackend::new();
//! let offset = backend.append(b"frame").unwrap();
//! assert_eq!(offset, 0);
//! assert_eq!(backend.read_at(0, 5).unwrap(), b"frame");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
