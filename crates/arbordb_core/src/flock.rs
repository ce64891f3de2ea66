//! Advisory file locking.
//!
//! Single-writer access is enforced with an exclusive advisory lock on a
//! `<canonical>.lock` sibling file, held for the life of the store
//! instance. Acquisition retries a bounded number of times with
//! exponential backoff; a lock file whose mtime is older than the
//! staleness horizon is considered abandoned by a wedged process and is
//! broken. Live holders refresh the mtime on every save cycle.

use crate::error::{EngineError, EngineResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Acquisition attempts beyond the first.
const RETRIES: u32 = 3;
/// First backoff step; doubles per retry.
const BACKOFF_BASE: Duration = Duration::from_millis(50);
/// A held lock untouched for this long is considered stale.
const STALE_AFTER: Duration = Duration::from_secs(7);

/// An exclusive advisory lock, released when dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquires the lock at `path`, retrying with exponential backoff and
    /// breaking stale lock files.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::LockUnavailable`] when the lock is still
    /// held after every retry.
    pub fn acquire(path: &Path) -> EngineResult<Self> {
        let mut backoff = BACKOFF_BASE;
        for attempt in 0..=RETRIES {
            match Self::try_acquire(path)? {
                Some(lock) => return Ok(lock),
                None => {
                    if Self::break_if_stale(path)? {
                        continue;
                    }
                    if attempt < RETRIES {
                        std::thread::sleep(backoff);
                        backoff *= 2;
                    }
                }
            }
        }
        Err(EngineError::lock_unavailable(format!(
            "another process holds {}",
            path.display()
        )))
    }

    /// Updates the lock file's mtime so other processes do not consider
    /// this holder stale. Called by the save path.
    pub fn refresh(&self) -> EngineResult<()> {
        let mut file = &self.file;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;
        Ok(())
    }

    fn try_acquire(path: &Path) -> EngineResult<Option<Self>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Ok(None);
        }

        let lock = Self { file };
        // Pid recorded for debugging; the write also stamps the mtime.
        lock.refresh()?;
        Ok(Some(lock))
    }

    /// Removes the lock file when its mtime is past the staleness
    /// horizon. Returns whether it was broken.
    fn break_if_stale(path: &Path) -> EngineResult<bool> {
        let Ok(metadata) = fs::metadata(path) else {
            // Vanished between attempts; retry immediately.
            return Ok(true);
        };
        let modified = metadata.modified()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);

        if age > STALE_AFTER {
            fs::remove_file(path)?;
            return Ok(true);
        }
        Ok(false)
    }
}
