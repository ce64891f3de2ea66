//! Debounced save scheduling.
//!
//! Every mutation arms (or re-arms) a single-shot deadline. When it
//! expires, the worker thread performs one snapshot; every caller that
//! scheduled during the window holds the same [`SaveHandle`] and observes
//! the same outcome. Exactly one snapshot is in flight at a time: a
//! mutation arriving mid-save mints the next cycle, which runs after the
//! current one finishes.

use crate::error::{EngineError, EngineResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// The save callback run by the worker thread.
pub type SaveFn = Box<dyn Fn() -> EngineResult<()> + Send + Sync>;

#[derive(Debug, Default)]
struct Cycle {
    outcome: Mutex<Option<EngineResult<()>>>,
    done: Condvar,
}

impl Cycle {
    fn complete(&self, result: EngineResult<()>) {
        let mut outcome = self.outcome.lock();
        *outcome = Some(result);
        self.done.notify_all();
    }
}

/// Resolves when the snapshot cycle that adopted the caller's mutation
/// completes. Cloned freely; every clone sees the same outcome.
#[derive(Debug, Clone)]
pub struct SaveHandle {
    cycle: Arc<Cycle>,
}

impl SaveHandle {
    fn pending() -> Self {
        Self {
            cycle: Arc::new(Cycle::default()),
        }
    }

    fn resolved(result: EngineResult<()>) -> Self {
        let handle = Self::pending();
        handle.cycle.complete(result);
        handle
    }

    /// Blocks until the cycle completes and returns its outcome.
    pub fn wait(&self) -> EngineResult<()> {
        let mut outcome = self.cycle.outcome.lock();
        while outcome.is_none() {
            self.cycle.done.wait(&mut outcome);
        }
        outcome.clone().unwrap_or(Ok(()))
    }

    /// Waits up to `timeout`; `None` when the cycle is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<EngineResult<()>> {
        let deadline = Instant::now() + timeout;
        let mut outcome = self.cycle.outcome.lock();
        while outcome.is_none() {
            if self.cycle.done.wait_until(&mut outcome, deadline).timed_out() {
                return outcome.clone();
            }
        }
        outcome.clone()
    }

    /// Returns whether the cycle has completed.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cycle.outcome.lock().is_some()
    }
}

#[derive(Debug)]
struct State {
    /// The armed cycle and its deadline, if any.
    armed: Option<(Arc<Cycle>, Instant)>,
    shutdown: bool,
}

/// Owns the worker thread that executes debounced saves.
pub struct Scheduler {
    state: Arc<(Mutex<State>, Condvar)>,
    delay: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Spawns the worker. `save` runs once per expired cycle.
    pub fn spawn(delay: Duration, save: SaveFn) -> Self {
        let state = Arc::new((
            Mutex::new(State {
                armed: None,
                shutdown: false,
            }),
            Condvar::new(),
        ));

        let worker_state = Arc::clone(&state);
        let worker = thread::Builder::new()
            .name("arbordb-save".into())
            .spawn(move || Self::run(&worker_state, &save))
            .expect("failed to spawn save worker");

        Self {
            state,
            delay,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Joins the armed cycle, re-arming its deadline, or mints a new one.
    pub fn schedule(&self) -> SaveHandle {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();

        if state.shutdown {
            return SaveHandle::resolved(Err(EngineError::EngineClosed));
        }

        let deadline = Instant::now() + self.delay;
        let cycle = match &mut state.armed {
            Some((cycle, armed_deadline)) => {
                *armed_deadline = deadline;
                Arc::clone(cycle)
            }
            None => {
                let cycle = Arc::new(Cycle::default());
                state.armed = Some((Arc::clone(&cycle), deadline));
                cycle
            }
        };
        cvar.notify_one();
        SaveHandle { cycle }
    }

    /// Runs any armed cycle immediately, then stops the worker.
    pub fn shutdown(&self) {
        {
            let (lock, cvar) = &*self.state;
            let mut state = lock.lock();
            state.shutdown = true;
            cvar.notify_one();
        }
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }

    fn run(state: &Arc<(Mutex<State>, Condvar)>, save: &SaveFn) {
        let (lock, cvar) = &**state;
        loop {
            let cycle = {
                let mut state = lock.lock();
                loop {
                    match &state.armed {
                        None if state.shutdown => return,
                        None => {
                            cvar.wait(&mut state);
                        }
                        Some((_, deadline)) => {
                            let deadline = *deadline;
                            if state.shutdown || Instant::now() >= deadline {
                                // Take the cycle; the armed slot is free
                                // for the next one while this save runs.
                                break state.armed.take().map(|(c, _)| c);
                            }
                            cvar.wait_until(&mut state, deadline);
                        }
                    }
                }
            };

            if let Some(cycle) = cycle {
                cycle.complete(save());
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
