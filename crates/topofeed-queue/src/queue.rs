//! Bounded delta queue with oldest-pair consolidation
//!
//! Entries are kept oldest-first. Order matters: an update or removal can only
//! be interpreted relative to the adds that came before it, so consolidation
//! always folds the two *oldest* entries and the result takes the oldest slot.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use topofeed_core::Consolidate;
use tracing::debug;

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 100;

/// Smallest capacity that still leaves a pair to consolidate.
const MIN_CAPACITY: usize = 2;

/// Arrival sequence number of a queued delta
pub type SeqNo = u64;

/// A delta tagged with its arrival sequence.
///
/// A consolidated entry keeps the sequence number of the older of its two
/// sources, so sequence numbers in the queue are always strictly increasing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TaggedDelta<D> {
    pub seq: SeqNo,
    pub delta: D,
}

/// What `push` did with a delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushOutcome {
    /// Degenerate delta, nothing was stored.
    Discarded,
    /// Appended without touching existing entries.
    Queued,
    /// The two oldest entries were folded into one to make room.
    Consolidated,
}

/// Ordered, capacity-bounded queue of pending deltas.
#[derive(Debug, Clone)]
pub struct DeltaQueue<D: Consolidate> {
    /// Last assigned sequence number
    current_seq: SeqNo,
    /// Pending deltas, oldest first
    deltas: VecDeque<TaggedDelta<D>>,
    /// Maximum entries held after a push completes
    capacity: usize,
    /// Number of consolidations performed since creation
    consolidations: u64,
}

impl<D: Consolidate> DeltaQueue<D> {
    /// Create a queue. Capacities below 2 are raised to 2, since a single
    /// slot leaves nothing to consolidate.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            current_seq: 0,
            deltas: VecDeque::with_capacity(capacity),
            capacity,
            consolidations: 0,
        }
    }

    /// Append a delta, consolidating the two oldest entries first if the
    /// queue is full.
    pub fn push(&mut self, delta: D) -> PushOutcome {
        if delta.is_degenerate() {
            debug!("Discarding empty delta");
            return PushOutcome::Discarded;
        }

        let outcome = if self.deltas.len() >= self.capacity {
            self.consolidate_oldest();
            PushOutcome::Consolidated
        } else {
            PushOutcome::Queued
        };

        self.current_seq += 1;
        self.deltas.push_back(TaggedDelta {
            seq: self.current_seq,
            delta,
        });
        debug!(size = self.deltas.len(), "Buffering delta");
        outcome
    }

    /// Remove and return the oldest pending delta.
    pub fn pop_oldest(&mut self) -> Option<D> {
        self.deltas.pop_front().map(|td| td.delta)
    }

    /// Oldest pending entry without removing it.
    pub fn peek_oldest(&self) -> Option<&TaggedDelta<D>> {
        self.deltas.front()
    }

    /// Pending entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TaggedDelta<D>> {
        self.deltas.iter()
    }

    /// Number of pending deltas
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Last assigned sequence number
    pub fn current_seq(&self) -> SeqNo {
        self.current_seq
    }

    /// How many times the queue has folded entries to stay in bounds
    pub fn consolidations(&self) -> u64 {
        self.consolidations
    }

    /// Drop every pending delta. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.deltas.len();
        self.deltas.clear();
        dropped
    }

    /// Fold the second-oldest entry into the oldest one.
    fn consolidate_oldest(&mut self) {
        if self.deltas.len() < MIN_CAPACITY {
            return;
        }

        let Some(oldest) = self.deltas.pop_front() else {
            return;
        };
        let Some(second) = self.deltas.pop_front() else {
            self.deltas.push_front(oldest);
            return;
        };

        self.consolidations += 1;
        let merged = oldest.delta.consolidate(&second.delta);
        if merged.is_degenerate() {
            // everything in the pair cancelled out
            debug!(size = self.deltas.len(), "Consolidated pair cancelled out");
            return;
        }

        self.deltas.push_front(TaggedDelta {
            seq: oldest.seq,
            delta: merged,
        });
        debug!(size = self.deltas.len(), "Consolidated oldest deltas");
    }
}

impl<D: Consolidate> Default for DeltaQueue<D> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
