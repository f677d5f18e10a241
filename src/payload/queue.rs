use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::payload::model::Payload;

/// Unbounded FIFO of pending payloads for one overlay channel.
///
/// Producers enqueue from any thread; the engine dequeues one payload at a time through its fetch
/// callback. The lock is only held for the push/pop itself.
#[derive(Debug, Default)]
pub struct PayloadQueue {
    items: Mutex<VecDeque<Payload>>,
}

impl PayloadQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail.
    pub fn enqueue(&self, payload: Payload) {
        let mut items = self.items.lock();
        items.push_back(payload);
        tracing::trace!(pending = items.len(), "payload enqueued");
    }

    /// Remove and return the head, if any.
    pub fn dequeue(&self) -> Option<Payload> {
        self.items.lock().pop_front()
    }

    /// Number of pending payloads.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drop every pending payload, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let dropped = items.len();
        items.clear();
        dropped
    }
}

#[cfg(test)]
#[path = "../../tests/unit/payload/queue.rs"]
mod tests;
