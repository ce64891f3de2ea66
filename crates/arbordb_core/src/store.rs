//! The store façade: open, recovery, reads, mutations, lifecycle.

use crate::codec::Codec;
use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::events::{Event, EventBus, EventReceiver};
use crate::flock::FileLock;
use crate::index::IndexManager;
use crate::mutation::{BatchOp, Mutation};
use crate::path;
use crate::query::{self, FindOptions};
use crate::queue::MutationQueue;
use crate::scheduler::{SaveHandle, Scheduler};
use crate::snapshot::{self, SnapshotWriter};
use crate::wal::{WalEntry, WalManager};
use arbordb_storage::FileBackend;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Opening,
    Ready,
    Closing,
    Closed,
    Failed,
}

/// The canonical file and its siblings.
#[derive(Debug, Clone)]
struct StorePaths {
    canonical: PathBuf,
    wal: PathBuf,
    tmp: PathBuf,
    lock: PathBuf,
}

impl StorePaths {
    fn new(canonical: PathBuf) -> Self {
        Self {
            wal: sibling(&canonical, ".wal"),
            tmp: sibling(&canonical, ".tmp"),
            lock: sibling(&canonical, ".lock"),
            canonical,
        }
    }
}

fn sibling(canonical: &Path, suffix: &str) -> PathBuf {
    let mut name = canonical.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// State guarded by the single-writer lock: the live document, the
/// pending queue, the index maps and the WAL sequence counter.
#[derive(Debug)]
struct Core {
    doc: Value,
    queue: MutationQueue,
    indices: IndexManager,
    next_seq: u64,
}

struct Inner {
    config: Config,
    paths: StorePaths,
    codec: Codec,
    writer: SnapshotWriter,
    wal: Option<WalManager>,
    core: Mutex<Core>,
    state: RwLock<Lifecycle>,
    events: EventBus,
    scheduler: Scheduler,
    lock: Mutex<Option<FileLock>>,
    save_generation: AtomicU64,
    init_error: Option<EngineError>,
}

/// An embedded, single-file JSON document store.
///
/// Cloning a `Store` clones a handle; all clones share one engine. See
/// the crate docs for an overview and [`Config`] for the options.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Opens (or creates) the store at `filename`.
    ///
    /// Recovery runs before this returns: a leftover temp snapshot is
    /// reconciled, the WAL is replayed, and every configured index is
    /// rebuilt.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PathEscape`] when `filename` resolves outside the
    ///   working directory
    /// - [`EngineError::LockUnavailable`] when another process holds the
    ///   store
    /// - [`EngineError::DecryptionFailed`] when a keyed snapshot cannot
    ///   be authenticated (terminal — the key is wrong or the file is
    ///   corrupt)
    /// - [`EngineError::UniqueIndexViolation`] when the recovered
    ///   document already violates a unique index
    pub fn open(filename: impl AsRef<Path>, config: Config) -> EngineResult<Self> {
        let canonical = guard_containment(filename.as_ref())?;
        let paths = StorePaths::new(canonical);
        let codec = Codec::new(config.key.as_ref(), config.indented);

        let lock = FileLock::acquire(&paths.lock)?;

        snapshot::reconcile_temp(&paths.canonical, &paths.tmp, |bytes| {
            codec.decode_snapshot(bytes).is_ok()
        })?;

        let mut init_error = None;
        let mut doc = if paths.canonical.exists() {
            let bytes = fs::read(&paths.canonical)?;
            match codec.decode_snapshot(&bytes) {
                Ok(value) if value.is_object() => value,
                Ok(_) => {
                    init_error = Some(EngineError::syntax_invalid("snapshot root is not an object"));
                    Value::Object(Map::new())
                }
                Err(err @ EngineError::DecryptionFailed { .. }) => return Err(err),
                Err(err) => {
                    init_error = Some(err);
                    Value::Object(Map::new())
                }
            }
        } else {
            Value::Object(Map::new())
        };

        let wal = if config.use_wal {
            Some(WalManager::new(Box::new(FileBackend::open(&paths.wal)?)))
        } else {
            None
        };

        let mut next_seq = 1;
        if let Some(wal) = &wal {
            next_seq = replay_wal(wal, &codec, &mut doc, config.silent)? + 1;
        }

        let mut indices = IndexManager::new(config.indices.clone());
        indices.rebuild_all(&doc)?;

        let core = Core {
            doc,
            queue: MutationQueue::new(config.queue_limit),
            indices,
            next_seq,
        };

        let save_delay = config.save_delay;
        let writer = SnapshotWriter::new(paths.canonical.clone(), paths.tmp.clone());
        let inner = Arc::new_cyclic(|weak: &std::sync::Weak<Inner>| {
            let save_target = weak.clone();
            let scheduler = Scheduler::spawn(
                save_delay,
                Box::new(move || match save_target.upgrade() {
                    Some(inner) => inner.save_cycle(),
                    None => Ok(()),
                }),
            );
            Inner {
                config,
                paths,
                codec,
                writer,
                wal,
                core: Mutex::new(core),
                state: RwLock::new(Lifecycle::Opening),
                events: EventBus::new(),
                scheduler,
                lock: Mutex::new(Some(lock)),
                save_generation: AtomicU64::new(0),
                init_error,
            }
        });

        *inner.state.write() = Lifecycle::Ready;
        inner.events.emit(Event::Ready);
        if let Some(err) = &inner.init_error {
            if !inner.config.silent {
                warn!(error = %err, "store opened with an initialization error");
            }
            inner.events.emit(Event::Error {
                kind: err.kind(),
                message: err.to_string(),
            });
        }

        Ok(Self { inner })
    }

    /// Returns the canonical file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.paths.canonical
    }

    /// Returns the initialization error recorded when the store opened
    /// with a fallback empty root.
    #[must_use]
    pub fn init_error(&self) -> Option<&EngineError> {
        self.inner.init_error.as_ref()
    }

    /// Subscribes to [`Event`]s.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    /// Reads the value at `path`. The empty path returns the whole root.
    pub fn get(&self, target: &str) -> EngineResult<Option<Value>> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;
        Ok(path::get(&core.doc, &path::parse(target)).cloned())
    }

    /// Returns whether every segment of `path` resolves.
    pub fn has(&self, target: &str) -> EngineResult<bool> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;
        Ok(path::has(&core.doc, &path::parse(target)))
    }

    /// Finds collection elements matching `query`, shaped by `options`.
    ///
    /// The collection at `path` may be an array or an object (object
    /// values are scanned in insertion order); anything else yields no
    /// results.
    pub fn find(
        &self,
        target: &str,
        query: &Value,
        options: &FindOptions,
    ) -> EngineResult<Vec<Value>> {
        self.find_where(target, |item| query::matches(item, query), options)
    }

    /// Finds collection elements satisfying an opaque predicate.
    pub fn find_where(
        &self,
        target: &str,
        predicate: impl Fn(&Value) -> bool,
        options: &FindOptions,
    ) -> EngineResult<Vec<Value>> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;

        let items = match path::get(&core.doc, &path::parse(target)) {
            Some(collection) => query::collection_items(collection),
            None => Vec::new(),
        };
        drop(core);

        let matched = items.into_iter().filter(|item| predicate(item)).collect();
        Ok(query::apply_options(matched, options))
    }

    /// Returns the first element matching `query`, in iteration order.
    pub fn find_one(&self, target: &str, query: &Value) -> EngineResult<Option<Value>> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;

        let found = match path::get(&core.doc, &path::parse(target)) {
            Some(Value::Array(items)) => items.iter().find(|i| query::matches(i, query)).cloned(),
            Some(Value::Object(map)) => {
                map.values().find(|i| query::matches(i, query)).cloned()
            }
            _ => None,
        };
        Ok(found)
    }

    /// Point lookup through a configured index.
    pub fn find_by_index(&self, name: &str, value: &Value) -> EngineResult<Option<Value>> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;
        Ok(core.indices.lookup(&core.doc, name, value))
    }

    /// Returns one page of the collection at `path`, 1-based.
    pub fn paginate(&self, target: &str, page: usize, limit: usize) -> EngineResult<Vec<Value>> {
        let options = FindOptions::new()
            .skip(page.saturating_sub(1).saturating_mul(limit))
            .limit(limit);
        self.find(target, &Value::Object(Map::new()), &options)
    }

    /// Writes `value` at `path`. Resolves on the next durable snapshot.
    pub fn set(&self, target: &str, value: Value) -> EngineResult<SaveHandle> {
        self.mutate(Mutation::Set {
            path: target.into(),
            value,
        })
    }

    /// Removes the value at `path`. Resolves on the next durable
    /// snapshot.
    pub fn delete(&self, target: &str) -> EngineResult<SaveHandle> {
        self.mutate(Mutation::Delete {
            path: target.into(),
        })
    }

    /// Appends each item not already present (by deep equality) to the
    /// array at `path`, creating the array when missing.
    pub fn push(&self, target: &str, items: Vec<Value>) -> EngineResult<SaveHandle> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;
        let mutation = lower_push(&core.doc, target, items)?;
        self.inner.submit(&mut core, mutation)?;
        drop(core);
        Ok(self.inner.scheduler.schedule())
    }

    /// Removes every element of the array at `path` deep-equal to one of
    /// `items`.
    pub fn pull(&self, target: &str, items: Vec<Value>) -> EngineResult<SaveHandle> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;

        let segments = path::parse(target);
        let retained = match path::get(&core.doc, &segments) {
            Some(Value::Array(existing)) => existing
                .iter()
                .filter(|candidate| !items.contains(candidate))
                .cloned()
                .collect(),
            _ => {
                return Err(EngineError::path_type_mismatch(
                    target,
                    "pull target is not an array",
                ))
            }
        };

        self.inner.submit(
            &mut core,
            Mutation::Set {
                path: target.into(),
                value: Value::Array(retained),
            },
        )?;
        drop(core);
        Ok(self.inner.scheduler.schedule())
    }

    /// Atomically adds `amount` to the number at `path`, treating an
    /// absent value as zero. Integer targets stay integers when `amount`
    /// is integral.
    pub fn add(&self, target: &str, amount: f64) -> EngineResult<SaveHandle> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;

        let segments = path::parse(target);
        let current = path::get(&core.doc, &segments);
        let new_value = match current {
            None => number_value(target, 0.0, amount, true)?,
            Some(Value::Number(n)) => {
                let integral = n.as_i64().is_some();
                number_value(target, n.as_f64().unwrap_or(0.0), amount, integral)?
            }
            Some(_) => {
                return Err(EngineError::path_type_mismatch(
                    target,
                    "add target is not a number",
                ))
            }
        };

        self.inner.submit(
            &mut core,
            Mutation::Set {
                path: target.into(),
                value: new_value,
            },
        )?;
        drop(core);
        Ok(self.inner.scheduler.schedule())
    }

    /// Runs `f` against a deep clone of the root. The returned value
    /// atomically replaces the root; returning `None` aborts with
    /// [`EngineError::TransactionAborted`] and leaves the document
    /// untouched.
    ///
    /// Resolves to the committed (pre-snapshot) root together with the
    /// shared save handle.
    pub fn transaction(
        &self,
        f: impl FnOnce(Value) -> Option<Value>,
    ) -> EngineResult<(Value, SaveHandle)> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.flush_queue(&mut core)?;

        let draft = core.doc.clone();
        let new_root = f(draft).ok_or(EngineError::TransactionAborted)?;

        self.inner.submit(
            &mut core,
            Mutation::Set {
                path: String::new(),
                value: new_root,
            },
        )?;

        let committed = core.doc.clone();
        drop(core);
        Ok((committed, self.inner.scheduler.schedule()))
    }

    /// Applies an ordered list of operations. All of them commit to the
    /// same snapshot cycle.
    ///
    /// On error the already-applied prefix stays applied (and scheduled);
    /// the failing operation and everything after it are not.
    pub fn batch(&self, ops: Vec<BatchOp>) -> EngineResult<SaveHandle> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();

        let mut applied = 0usize;
        let mut failure = None;
        for op in ops {
            let outcome = match op {
                BatchOp::Set { path, value } => {
                    self.inner.submit(&mut core, Mutation::Set { path, value })
                }
                BatchOp::Delete { path } => {
                    self.inner.submit(&mut core, Mutation::Delete { path })
                }
                BatchOp::Push { path, items } => {
                    let lowered = match self.inner.flush_queue(&mut core) {
                        Ok(()) => lower_push(&core.doc, &path, items),
                        Err(err) => Err(err),
                    };
                    match lowered {
                        Ok(mutation) => self.inner.submit(&mut core, mutation),
                        Err(err) => Err(err),
                    }
                }
            };
            match outcome {
                Ok(()) => applied += 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        drop(core);

        match failure {
            None => Ok(self.inner.scheduler.schedule()),
            Some(err) => {
                if applied > 0 {
                    let _ = self.inner.scheduler.schedule();
                }
                Err(err)
            }
        }
    }

    /// Resets the root to an empty object.
    pub fn clear(&self) -> EngineResult<SaveHandle> {
        self.mutate(Mutation::Set {
            path: String::new(),
            value: Value::Object(Map::new()),
        })
    }

    /// Forces a durable snapshot of the current state, then copies the
    /// canonical file to `<canonical>.<label>`. Returns the copy's path.
    pub fn snapshot_copy(&self, label: &str) -> EngineResult<PathBuf> {
        self.inner.ensure_ready()?;
        self.inner.scheduler.schedule().wait()?;

        let source = &self.inner.paths.canonical;
        if !source.exists() {
            return Err(EngineError::FileMissing {
                path: source.display().to_string(),
            });
        }
        let dest = sibling(source, &format!(".{label}"));
        fs::copy(source, &dest)?;
        Ok(dest)
    }

    /// Awaits any in-flight snapshot, persists pending mutations, and
    /// releases the advisory lock. Idempotent.
    pub fn close(&self) -> EngineResult<()> {
        {
            let mut state = self.inner.state.write();
            if matches!(*state, Lifecycle::Closed) {
                return Ok(());
            }
            *state = Lifecycle::Closing;
        }

        self.inner.scheduler.shutdown();
        *self.inner.state.write() = Lifecycle::Closed;
        *self.inner.lock.lock() = None;
        if !self.inner.config.silent {
            debug!(path = %self.inner.paths.canonical.display(), "store closed");
        }
        Ok(())
    }

    fn mutate(&self, mutation: Mutation) -> EngineResult<SaveHandle> {
        self.inner.ensure_ready()?;
        let mut core = self.inner.core.lock();
        self.inner.submit(&mut core, mutation)?;
        drop(core);
        Ok(self.inner.scheduler.schedule())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.inner.paths.canonical)
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn ensure_ready(&self) -> EngineResult<()> {
        match *self.state.read() {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Failed => Err(EngineError::EngineUnusable),
            Lifecycle::Opening | Lifecycle::Closing | Lifecycle::Closed => {
                Err(EngineError::EngineClosed)
            }
        }
    }

    /// Routes a mutation: eagerly applied when any fallible check needs
    /// the latest state, buffered otherwise.
    fn submit(&self, core: &mut Core, mutation: Mutation) -> EngineResult<()> {
        let segments = path::parse(mutation.path());
        let eager = self.config.validator.is_some()
            || segments.is_empty()
            || core.indices.relates(&segments)
            || core.queue.collides(&segments);

        if eager {
            self.flush_queue(core)?;
            return self.apply_checked(core, mutation);
        }

        // Independent of everything buffered: pre-flight against the live
        // document, log, and defer the apply.
        check_mutation(&core.doc, &mutation, &segments)?;
        self.wal_append(core, &mutation)?;
        let head = segments.into_iter().next();
        if core.queue.push(mutation, head) {
            self.flush_queue(core)?;
        }
        Ok(())
    }

    /// Eager pipeline: every fallible check runs before the WAL append,
    /// so a recorded mutation always applies and a rejected one has
    /// touched nothing.
    fn apply_checked(&self, core: &mut Core, mutation: Mutation) -> EngineResult<()> {
        let segments = path::parse(mutation.path());
        check_mutation(&core.doc, &mutation, &segments)?;

        let plan = core.indices.prepare(&core.doc, &mutation)?;

        if let Some(validator) = &self.config.validator {
            let mut candidate = core.doc.clone();
            apply_mutation(&mut candidate, &mutation)?;
            validator
                .validate(&candidate)
                .map_err(|issues| EngineError::ValidationFailed { issues })?;
        }

        self.wal_append(core, &mutation)?;
        apply_mutation(&mut core.doc, &mutation)?;
        core.indices.commit(plan, &core.doc)
    }

    fn flush_queue(&self, core: &mut Core) -> EngineResult<()> {
        if core.queue.is_empty() {
            return Ok(());
        }
        for mutation in core.queue.drain() {
            apply_mutation(&mut core.doc, &mutation)?;
        }
        Ok(())
    }

    fn wal_append(&self, core: &mut Core, mutation: &Mutation) -> EngineResult<()> {
        if let Some(wal) = &self.wal {
            let entry = WalEntry::new(core.next_seq, mutation.clone());
            let payload = self.codec.encode_wal_payload(&entry)?;
            wal.append(&payload)
                .map_err(|err| EngineError::durability_failed(err.to_string()))?;
        }
        core.next_seq += 1;
        Ok(())
    }

    /// One scheduler cycle: flush, serialize, write atomically, truncate
    /// the WAL, reset the sequence, announce.
    fn perform_save(&self) -> EngineResult<()> {
        let mut core = self.core.lock();
        self.flush_queue(&mut core)?;

        let bytes = match self.codec.encode_snapshot(&core.doc) {
            Ok(bytes) => bytes,
            Err(err) => {
                if matches!(err, EngineError::EncryptionFailed { .. }) {
                    // The cipher can never persist again; poison the
                    // engine instead of looping on a broken save path.
                    *self.state.write() = Lifecycle::Failed;
                }
                return Err(err);
            }
        };

        match self.lock.lock().as_ref() {
            Some(lock) => lock
                .refresh()
                .map_err(|err| EngineError::lock_contention(err.to_string()))?,
            None => {
                return Err(EngineError::lock_contention(
                    "advisory lock released during save",
                ))
            }
        }

        self.writer
            .write(&bytes)
            .map_err(|err| EngineError::durability_failed(err.to_string()))?;

        if let Some(wal) = &self.wal {
            wal.clear()?;
        }
        core.next_seq = 1;
        drop(core);

        let generation = self.save_generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        self.events.emit(Event::Write { generation });
        Ok(())
    }

    fn save_cycle(&self) -> EngineResult<()> {
        let result = self.perform_save();
        if let Err(err) = &result {
            if !self.config.silent {
                error!(error = %err, "snapshot cycle failed; WAL retained, next cycle retries");
            }
            self.events.emit(Event::Error {
                kind: err.kind(),
                message: err.to_string(),
            });
        }
        result
    }
}

/// Pre-flights a mutation against `doc` without applying it.
fn check_mutation(doc: &Value, mutation: &Mutation, segments: &[String]) -> EngineResult<()> {
    match mutation {
        Mutation::Set { path: p, value } => path::check_set(doc, p, segments, value),
        Mutation::Delete { path: p } => path::check_unset(doc, p, segments).map(|_| ()),
    }
}

/// Applies a pre-flighted mutation.
fn apply_mutation(doc: &mut Value, mutation: &Mutation) -> EngineResult<()> {
    let segments = path::parse(mutation.path());
    match mutation {
        Mutation::Set { path: p, value } => path::set(doc, p, &segments, value.clone()),
        Mutation::Delete { path: p } => path::unset(doc, p, &segments).map(|_| ()),
    }
}

/// Lowers `push` to a `Set` of the deduplicated array.
fn lower_push(doc: &Value, target: &str, items: Vec<Value>) -> EngineResult<Mutation> {
    let segments = path::parse(target);
    let mut array = match path::get(doc, &segments) {
        Some(Value::Array(existing)) => existing.clone(),
        None => Vec::new(),
        Some(_) => {
            return Err(EngineError::path_type_mismatch(
                target,
                "push target is not an array",
            ))
        }
    };
    for item in items {
        if !array.contains(&item) {
            array.push(item);
        }
    }
    Ok(Mutation::Set {
        path: target.into(),
        value: Value::Array(array),
    })
}

/// Builds the result number for `add`, keeping integral targets
/// integral.
fn number_value(target: &str, current: f64, amount: f64, integral: bool) -> EngineResult<Value> {
    let sum = current + amount;
    if integral && amount.fract() == 0.0 && sum >= i64::MIN as f64 && sum <= i64::MAX as f64 {
        return Ok(Value::from(sum as i64));
    }
    serde_json::Number::from_f64(sum)
        .map(Value::Number)
        .ok_or_else(|| EngineError::path_type_mismatch(target, "add produced a non-finite number"))
}

/// Replays the WAL over `doc`; truncates at the last good frame
/// boundary. Returns the last applied sequence number.
fn replay_wal(
    wal: &WalManager,
    codec: &Codec,
    doc: &mut Value,
    silent: bool,
) -> EngineResult<u64> {
    if wal.is_empty()? {
        return Ok(0);
    }
    let frames = wal.read_frames()?;
    let mut last_seq = 0u64;
    let mut boundary = 0u64;

    for frame in frames {
        let entry: WalEntry = match codec.decode_wal_payload(&frame.payload) {
            Ok(entry) => entry,
            Err(_) => break,
        };
        if entry.seq <= last_seq {
            break;
        }
        if apply_mutation(doc, &entry.op).is_err() {
            break;
        }
        last_seq = entry.seq;
        boundary = frame.end();
    }

    let total = wal.len()?;
    if boundary < total {
        if !silent {
            warn!(
                discarded = total - boundary,
                "truncating torn tail of write-ahead log"
            );
        }
        wal.truncate(boundary)?;
    }
    if last_seq > 0 && !silent {
        debug!(entries = last_seq, "replayed write-ahead log");
    }
    Ok(last_seq)
}

/// Resolves `filename` against the working directory and rejects paths
/// that escape it.
fn guard_containment(filename: &Path) -> EngineResult<PathBuf> {
    let cwd = std::env::current_dir()?;
    let absolute = if filename.is_absolute() {
        filename.to_path_buf()
    } else {
        cwd.join(filename)
    };
    let normalized = normalize(&absolute);
    if !normalized.starts_with(normalize(&cwd)) {
        return Err(EngineError::PathEscape {
            path: filename.display().to_string(),
        });
    }
    Ok(normalized)
}

/// Lexically resolves `.` and `..` components.
fn normalize(input: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in input.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sibling_paths_append_suffixes() {
        let paths = StorePaths::new(PathBuf::from("dir/data.json"));
        assert_eq!(paths.wal, PathBuf::from("dir/data.json.wal"));
        assert_eq!(paths.tmp, PathBuf::from("dir/data.json.tmp"));
        assert_eq!(paths.lock, PathBuf::from("dir/data.json.lock"));
    }

    #[test]
    fn normalize_resolves_dots() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn containment_rejects_escapes() {
        assert!(matches!(
            guard_containment(Path::new("../outside.json")),
            Err(EngineError::PathEscape { .. })
        ));
        assert!(matches!(
            guard_containment(Path::new("/definitely/not/here.json")),
            Err(EngineError::PathEscape { .. })
        ));
        assert!(guard_containment(Path::new("inside.json")).is_ok());
        assert!(guard_containment(Path::new("sub/dir/inside.json")).is_ok());
    }

    #[test]
    fn lower_push_dedupes_by_deep_equality() {
        let doc = json!({"log": [{"a": 1}, "x"]});
        let Mutation::Set { value, .. } =
            lower_push(&doc, "log", vec![json!({"a": 1}), json!("y")]).unwrap()
        else {
            panic!("push lowers to set");
        };
        assert_eq!(value, json!([{"a": 1}, "x", "y"]));
    }

    #[test]
    fn lower_push_creates_missing_array() {
        let Mutation::Set { value, .. } =
            lower_push(&json!({}), "log", vec![json!(1), json!(1)]).unwrap()
        else {
            panic!("push lowers to set");
        };
        assert_eq!(value, json!([1]));
    }

    #[test]
    fn lower_push_rejects_non_arrays() {
        let doc = json!({"log": "scalar"});
        assert!(matches!(
            lower_push(&doc, "log", vec![json!(1)]),
            Err(EngineError::PathTypeMismatch { .. })
        ));
    }

    #[test]
    fn add_keeps_integers_integral() {
        assert_eq!(number_value("n", 5.0, 3.0, true).unwrap(), json!(8));
        assert_eq!(number_value("n", 5.0, 0.5, true).unwrap(), json!(5.5));
        assert_eq!(number_value("n", 1.5, 1.0, false).unwrap(), json!(2.5));
    }

    #[test]
    fn add_rejects_non_finite_results() {
        assert!(number_value("n", f64::MAX, f64::MAX, false).is_err());
    }
}
