//! Write-ahead log.
//!
//! The WAL is an append-only sibling file (`<canonical>.wal`) holding every
//! acknowledged mutation that is not yet covered by a snapshot.
//!
//! ## Frame format
//!
//! ```text
//! | length (4, big-endian) | payload (length bytes) |
//! ```
//!
//! The payload is the UTF-8 JSON `{"seq": N, "op": {...}}` — or the JSON
//! envelope of that record when the store is keyed.
//!
//! ## Durability protocol
//!
//! - Frames are written, then the backing file is synced, before success
//!   is returned to the caller.
//! - Only the save path truncates the log, and only after the snapshot
//!   rename has completed.
//! - Sequence numbers increase monotonically from 1 and reset to 1 after
//!   each successful snapshot.
//!
//! ## Recovery policy
//!
//! A crash mid-append leaves a torn tail. The reader treats a short
//! header, a length that exceeds the remaining bytes, an unparseable (or
//! undecryptable) payload, and a sequence regression as end-of-log: the
//! good prefix is replayed and the file is truncated at the last good
//! frame boundary. There is no fatal corruption class in this format —
//! anything past the boundary is a crash artifact by construction.

mod manager;
mod record;

pub use manager::{Frame, WalManager};
pub use record::WalEntry;
