// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command queue.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::command::WireCommand;

/// Default number of commands buffered while the gateway is unreachable.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Bounded FIFO of outbound frames.
///
/// Any number of producers may push; a single sender task pops. Pushing never
/// waits: once the queue is full the oldest frame is discarded to make room,
/// so a long outage cannot grow memory without bound.
///
/// Cloning the queue yields another handle to the same buffer.
///
/// # Examples
///
/// ```
/// use domintell_lib::protocol::CommandQueue;
///
/// let queue = CommandQueue::with_capacity(2);
/// queue.push("A");
/// queue.push("B");
/// queue.push("C");
///
/// assert_eq!(queue.len(), 2);
/// assert_eq!(queue.dropped(), 1);
/// assert_eq!(queue.try_pop().as_deref(), Some("B"));
/// ```
#[derive(Clone)]
pub struct CommandQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    items: Mutex<VecDeque<String>>,
    capacity: usize,
    notify: Notify,
    dropped: AtomicU64,
}

impl CommandQueue {
    /// Creates a queue holding up to [`DEFAULT_QUEUE_CAPACITY`] frames.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a queue holding up to `capacity` frames.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(QueueInner {
                items: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY))),
                capacity,
                notify: Notify::new(),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Appends a frame, discarding the oldest one if the queue is full.
    ///
    /// Returns the discarded frame, if any.
    pub fn push(&self, command: impl WireCommand) -> Option<String> {
        let frame = command.to_wire();
        let evicted = {
            let mut items = self.inner.items.lock();
            let evicted = if items.len() >= self.inner.capacity {
                items.pop_front()
            } else {
                None
            };
            items.push_back(frame);
            evicted
        };

        if let Some(ref frame) = evicted {
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(frame = %frame, "Command queue full, dropping oldest command");
        }
        self.inner.notify.notify_one();
        evicted
    }

    /// Removes the next frame without waiting.
    #[must_use]
    pub fn try_pop(&self) -> Option<String> {
        self.inner.items.lock().pop_front()
    }

    /// Waits for and removes the next frame.
    ///
    /// Intended for a single consumer.
    pub async fn pop(&self) -> String {
        loop {
            if let Some(frame) = self.try_pop() {
                return frame;
            }
            // notify_one stores a permit when nobody waits, so a push that
            // lands between try_pop and here is not missed
            self.inner.notify.notified().await;
        }
    }

    /// Discards every queued frame.
    pub fn clear(&self) {
        self.inner.items.lock().clear();
    }

    /// Returns the number of queued frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }

    /// Returns the maximum number of queued frames.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Returns how many frames were discarded because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("len", &self.len())
            .field("capacity", &self.inner.capacity)
            .field("dropped", &self.dropped())
            .finish()
    }
}
