//! Pending mutation queue.
//!
//! Buffers mutations so a burst of small writes is applied to the document
//! in one pass. Entries are kept in strict FIFO order; the store flushes
//! the queue on any read, when the configured cap is reached, and before
//! every snapshot.
//!
//! Only mutations that are provably independent are buffered: anything
//! touching an indexed collection, the root, or the subtree of an already
//! queued entry is applied eagerly instead, which keeps every fallible
//! check ahead of the WAL append and makes a flush infallible.

use crate::mutation::Mutation;
use std::collections::VecDeque;

#[derive(Debug)]
struct QueuedMutation {
    mutation: Mutation,
    /// First path segment; `None` for the root.
    head: Option<String>,
}

/// FIFO buffer of mutations awaiting application to the live document.
#[derive(Debug)]
pub struct MutationQueue {
    entries: VecDeque<QueuedMutation>,
    limit: usize,
}

impl MutationQueue {
    /// Creates a queue that signals force-apply at `limit` entries.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Returns whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether a mutation whose path starts with `segments` would
    /// interact with a buffered entry.
    ///
    /// The root interacts with everything; otherwise two mutations
    /// interact iff they share their first segment, since a path write
    /// only touches the chain under its own head key.
    #[must_use]
    pub fn collides(&self, segments: &[String]) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        if segments.is_empty() {
            return true;
        }
        self.entries
            .iter()
            .any(|e| e.head.as_deref() == Some(segments[0].as_str()) || e.head.is_none())
    }

    /// Buffers a mutation. Returns `true` when the cap is reached and the
    /// queue must be flushed.
    pub fn push(&mut self, mutation: Mutation, head: Option<String>) -> bool {
        self.entries.push_back(QueuedMutation { mutation, head });
        self.entries.len() >= self.limit
    }

    /// Removes and returns every buffered mutation in insertion order.
    pub fn drain(&mut self) -> Vec<Mutation> {
        self.entries.drain(..).map(|e| e.mutation).collect()
    }
}
