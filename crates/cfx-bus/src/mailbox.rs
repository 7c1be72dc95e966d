//! # Mailbox
//!
//! Unbounded FIFO queue of CBTs owned by one module handle. Any thread may
//! push; only the owning worker pops.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use cfx_types::Cbt;
use parking_lot::{Condvar, Mutex};

/// Multi-producer, single-consumer CBT queue.
///
/// The worker parks on the condition variable while the queue is empty.
pub struct Mailbox {
    /// Name of the module that owns this mailbox.
    owner: String,
    queue: Mutex<VecDeque<Cbt>>,
    ready: Condvar,
}

impl Mailbox {
    /// Create an empty mailbox for `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            queue: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    /// Name of the owning module.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Append an envelope and wake the worker.
    pub fn push(&self, cbt: Cbt) {
        self.queue.lock().push_back(cbt);
        self.ready.notify_one();
    }

    /// Take the oldest envelope, blocking until one is available.
    pub fn recv(&self) -> Cbt {
        let mut queue = self.queue.lock();
        loop {
            if let Some(cbt) = queue.pop_front() {
                return cbt;
            }
            self.ready.wait(&mut queue);
        }
    }

    /// Take the oldest envelope, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Cbt> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.queue.lock();
        loop {
            if let Some(cbt) = queue.pop_front() {
                return Some(cbt);
            }
            if self.ready.wait_until(&mut queue, deadline).timed_out() {
                return queue.pop_front();
            }
        }
    }

    /// Take the oldest envelope without blocking.
    pub fn try_recv(&self) -> Option<Cbt> {
        self.queue.lock().pop_front()
    }

    /// Discard every queued envelope and enqueue `cbt` in one step.
    ///
    /// Returns the number of discarded envelopes. Used by shutdown so that
    /// nothing queued before the termination envelope is delivered.
    pub fn clear_and_inject(&self, cbt: Cbt) -> usize {
        let discarded = {
            let mut queue = self.queue.lock();
            let discarded = queue.len();
            queue.clear();
            queue.push_back(cbt);
            discarded
        };
        self.ready.notify_one();
        discarded
    }

    /// Number of queued envelopes.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("owner", &self.owner)
            .field("queued", &self.len())
            .finish()
    }
}
