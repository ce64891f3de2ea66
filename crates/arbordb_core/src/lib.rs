//! # ArborDB Core
//!
//! An embedded, single-file document store whose on-disk representation is
//! a JSON tree.
//!
//! The engine provides:
//! - Path-addressed reads and writes over an in-memory JSON document
//! - A write-ahead log flushed before acknowledgement, replayed on open
//! - Atomic snapshots (temp file + rename) coalesced by a debounced
//!   scheduler
//! - Maintained secondary indices with unique-constraint enforcement
//! - Optional AES-256-GCM encryption of everything written to disk
//!
//! ```rust,no_run
//! use arbordb_core::{Config, Store};
//! use serde_json::json;
//!
//! let store = Store::open("app-data.json", Config::default())?;
//! let handle = store.set("user.name", json!("John Doe"))?;
//! assert_eq!(store.get("user.name")?, Some(json!("John Doe")));
//! handle.wait()?; // durable once resolved
//! store.close()?;
//! # Ok::<(), arbordb_core::EngineError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod config;
mod crypto;
mod error;
mod events;
mod flock;
mod index;
mod mutation;
mod path;
mod query;
mod queue;
mod scheduler;
mod snapshot;
mod store;
mod wal;

pub use config::{Config, Validator};
pub use crypto::{EncryptionKey, Envelope, KEY_SIZE};
pub use error::{EngineError, EngineResult};
pub use events::{Event, EventReceiver};
pub use index::{IndexDefinition, Locator};
pub use mutation::{BatchOp, Mutation};
pub use query::FindOptions;
pub use scheduler::SaveHandle;
pub use store::Store;
