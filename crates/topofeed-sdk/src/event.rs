//! Feed events and counters for diagnostics.

use serde::{Deserialize, Serialize};

/// Events emitted by a buffering controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedEvent {
    /// A delta went straight to the consumer.
    Passed,
    /// A delta was held back.
    Buffered { size: usize },
    /// The two oldest held deltas were folded together to make room.
    Consolidated { size: usize },
    /// A held delta was delivered while catching up.
    Drained { remaining: usize },
    /// An empty delta was dropped.
    Discarded,
    /// The view was paused.
    Paused,
    /// The view was resumed with `buffered` deltas waiting.
    Resumed { buffered: usize },
    /// Held deltas were thrown away because the view context changed.
    Reset { dropped: usize },
    /// The consumer refused a delta.
    EmitFailed,
}

/// Running counters of a controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    /// Deltas delivered without buffering
    pub passed: u64,
    /// Deltas that entered the queue
    pub buffered: u64,
    /// Pairwise consolidations performed by the queue
    pub consolidations: u64,
    /// Deltas delivered from the queue
    pub drained: u64,
    /// Empty deltas dropped at the boundary
    pub discarded: u64,
    /// Deltas the sink refused
    pub emit_failures: u64,
    /// Resets, including context switches
    pub resets: u64,
}
