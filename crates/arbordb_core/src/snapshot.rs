//! Atomic snapshot writes and temp-file reconciliation.
//!
//! A snapshot is written to `<canonical>.tmp`, synced, and renamed over
//! the canonical file; the containing directory is then fsynced so the
//! rename itself is durable. At any instant the canonical file on disk is
//! either a complete previous snapshot or a complete new one — never a
//! partial write.

use crate::error::EngineResult;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes snapshots for one canonical file.
#[derive(Debug)]
pub struct SnapshotWriter {
    canonical: PathBuf,
    tmp: PathBuf,
}

impl SnapshotWriter {
    /// Creates a writer for `canonical`, with `tmp` as its sibling
    /// temporary path.
    #[must_use]
    pub fn new(canonical: PathBuf, tmp: PathBuf) -> Self {
        Self { canonical, tmp }
    }

    /// Writes `bytes` as the new canonical snapshot.
    ///
    /// Protocol: write the temp sibling, `sync_all` it, rename it over
    /// the canonical file, fsync the directory. On failure before the
    /// rename the temp file is left behind as a recovery candidate.
    pub fn write(&self, bytes: &[u8]) -> EngineResult<()> {
        {
            let mut file = File::create(&self.tmp)?;
            use std::io::Write;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        fs::rename(&self.tmp, &self.canonical)?;
        sync_parent_dir(&self.canonical)?;
        Ok(())
    }
}

/// Reconciles a leftover temp sibling at open time.
///
/// A temp file is promoted to canonical when the canonical file is
/// missing or older **and** the candidate decodes as a complete document
/// (`validate`); otherwise it is deleted as an orphan. Returns whether a
/// promotion happened.
pub fn reconcile_temp(
    canonical: &Path,
    tmp: &Path,
    validate: impl Fn(&[u8]) -> bool,
) -> EngineResult<bool> {
    if !tmp.exists() {
        return Ok(false);
    }

    let newer_than_canonical = match (fs::metadata(canonical), fs::metadata(tmp)) {
        (Ok(canon_meta), Ok(tmp_meta)) => match (canon_meta.modified(), tmp_meta.modified()) {
            (Ok(canon_time), Ok(tmp_time)) => tmp_time > canon_time,
            _ => false,
        },
        (Err(_), Ok(_)) => true,
        _ => false,
    };

    if newer_than_canonical {
        let bytes = fs::read(tmp)?;
        if validate(&bytes) {
            debug!(tmp = %tmp.display(), "promoting completed temp snapshot");
            fs::rename(tmp, canonical)?;
            sync_parent_dir(canonical)?;
            return Ok(true);
        }
        warn!(tmp = %tmp.display(), "discarding torn temp snapshot");
    }

    fs::remove_file(tmp)?;
    Ok(false)
}

/// Fsyncs the directory containing `path` so renames and unlinks survive
/// a crash. Directory fsync is a Unix concept; on other platforms the
/// journaling filesystem covers metadata durability.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> EngineResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            File::open(parent)?.sync_all()?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> EngineResult<()> {
    Ok(())
}
