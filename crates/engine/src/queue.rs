//! FIFO waiting queue.

use std::{collections::VecDeque, time::Instant};

use tokio::task::AbortHandle;

/// One handle waiting for a partner. The entry owns the abort handle of its
/// bot-fallback timer so that leaving the queue by any path cancels it.
#[derive(Debug)]
pub struct WaitingEntry {
    pub conn_id: String,
    pub enqueued_at: Instant,
    fallback: Option<AbortHandle>,
}

impl Drop for WaitingEntry {
    fn drop(&mut self) {
        if let Some(handle) = self.fallback.take() {
            handle.abort();
        }
    }
}

/// Ordered waiters, oldest first. A handle appears at most once.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    entries: VecDeque<WaitingEntry>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a waiter. Caller must ensure `conn_id` is not already queued.
    pub fn push(&mut self, conn_id: impl Into<String>, fallback: AbortHandle) {
        self.entries.push_back(WaitingEntry {
            conn_id: conn_id.into(),
            enqueued_at: Instant::now(),
            fallback: Some(fallback),
        });
    }

    /// Pop the oldest waiter. Its fallback timer is cancelled on drop of the
    /// returned entry.
    pub fn pop_front(&mut self) -> Option<WaitingEntry> {
        self.entries.pop_front()
    }

    /// Remove `conn_id` wherever it sits, cancelling its fallback timer.
    /// Returns true if it was queued.
    pub fn remove(&mut self, conn_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.conn_id != conn_id);
        self.entries.len() != before
    }

    /// Remove `conn_id` but hand its entry back to the caller, keeping the
    /// fallback timer alive. Used by the timer itself when it fires.
    pub fn take(&mut self, conn_id: &str) -> Option<WaitingEntry> {
        let pos = self.entries.iter().position(|e| e.conn_id == conn_id)?;
        let mut entry = self.entries.remove(pos)?;
        // The timer has already fired (or is firing); aborting it on drop
        // would be a no-op, but dropping the handle keeps the Drop impl from
        // touching a finished task.
        entry.fallback = None;
        Some(entry)
    }

    pub fn contains(&self, conn_id: &str) -> bool {
        self.entries.iter().any(|e| e.conn_id == conn_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
