//! Pending-request tracker.
//!
//! One entry per in-flight request, keyed by frame id and holding the
//! armed timeout timer. Resolution removes the entry and cancels its timer
//! in one step, so the "entry and timer live and die together" invariant
//! holds by construction, and a second resolution for the same id (late
//! real reply racing the synthetic timeout) is a no-op.

use std::collections::HashMap;

use frametree_core::FrameId;

use crate::timer::TimerHandle;

/// Tracks pending protocol requests and their timeout timers.
#[derive(Default)]
pub struct PendingRequests {
    pending: HashMap<FrameId, TimerHandle>,
}

impl PendingRequests {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-flight request. Replacing an existing entry cancels
    /// the superseded timer.
    pub fn register(&mut self, id: FrameId, timer: TimerHandle) {
        if let Some(stale) = self.pending.insert(id, timer) {
            stale.cancel();
        }
    }

    /// Resolve a pending request: remove the entry and cancel its timer.
    /// Returns `false` if nothing was pending for `id` (late or duplicate
    /// resolution — callers discard the triggering message).
    pub fn resolve(&mut self, id: &FrameId) -> bool {
        match self.pending.remove(id) {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a request is pending for `id`.
    pub fn has_pending(&self, id: &FrameId) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of in-flight requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no requests are in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancel every timer and forget all entries (sweep reset).
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.pending.drain() {
            timer.cancel();
        }
    }
}
