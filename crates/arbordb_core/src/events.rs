//! Store event fan-out.
//!
//! Subscribers receive lifecycle and durability events over a bounded
//! per-subscriber buffer. Emission never blocks the engine: when a slow
//! observer's buffer is full, the oldest non-error event is evicted.
//! Error events are never dropped — the buffer grows past its cap rather
//! than lose one.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Buffered events per subscriber before eviction kicks in.
const BUFFER_CAPACITY: usize = 256;

/// An event emitted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The store finished opening and recovery.
    Ready,
    /// A snapshot was written and renamed into place.
    Write {
        /// Snapshot generation, counting from 1 per store instance.
        generation: u64,
    },
    /// An operation or save cycle failed.
    Error {
        /// Stable error kind tag (see [`crate::EngineError::kind`]).
        kind: &'static str,
        /// Human-readable description.
        message: String,
    },
}

impl Event {
    fn is_critical(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[derive(Debug, Default)]
struct Buffer {
    queue: Mutex<VecDeque<Event>>,
    available: Condvar,
}

/// The receiving end of a subscription.
///
/// Dropping the receiver detaches it; the store stops delivering to it on
/// the next emission.
#[derive(Debug)]
pub struct EventReceiver {
    buffer: Arc<Buffer>,
}

impl EventReceiver {
    /// Returns the next buffered event without blocking.
    pub fn try_recv(&self) -> Option<Event> {
        self.buffer.queue.lock().pop_front()
    }

    /// Waits up to `timeout` for an event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        let mut queue = self.buffer.queue.lock();
        if queue.is_empty() {
            self.buffer.available.wait_for(&mut queue, timeout);
        }
        queue.pop_front()
    }

    /// Drains every buffered event.
    pub fn drain(&self) -> Vec<Event> {
        self.buffer.queue.lock().drain(..).collect()
    }
}

/// Distributes events to subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Weak<Buffer>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> EventReceiver {
        let buffer = Arc::new(Buffer::default());
        self.subscribers.lock().push(Arc::downgrade(&buffer));
        EventReceiver { buffer }
    }

    /// Delivers `event` to every live subscriber, evicting the oldest
    /// non-error event from any buffer that is full.
    pub fn emit(&self, event: Event) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|weak| {
            let Some(buffer) = weak.upgrade() else {
                return false;
            };

            let mut queue = buffer.queue.lock();
            if queue.len() >= BUFFER_CAPACITY && !event.is_critical() {
                if let Some(pos) = queue.iter().position(|e| !e.is_critical()) {
                    queue.remove(pos);
                } else {
                    // Saturated with errors; drop the newcomer instead.
                    return true;
                }
            }
            queue.push_back(event.clone());
            drop(queue);
            buffer.available.notify_one();
            true
        });
    }
}
