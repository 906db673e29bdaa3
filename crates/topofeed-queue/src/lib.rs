//! Topofeed Queue - bounded storage for held-back deltas
//!
//! While the consumer is paused, incoming deltas are parked in a
//! [`DeltaQueue`]. The queue never drops information to stay within its
//! capacity: when full, it folds its two oldest entries into one using
//! [`Consolidate`](topofeed_core::Consolidate) and only then appends.
//!
//! ```text
//! push(d):
//!   if degenerate(d): discard
//!   if len >= capacity:
//!     Q[0] = Q[0].consolidate(Q[1]); Q.remove(1)
//!   Q.push_back(d)
//!
//! pop_oldest():
//!   Q.pop_front()
//! ```
//!
//! # Example
//!
//! ```rust
//! use topofeed_core::{Node, NodesDelta};
//! use topofeed_queue::DeltaQueue;
//!
//! let mut queue: DeltaQueue<NodesDelta> = DeltaQueue::new(2);
//! for id in ["a", "b", "c"] {
//!     queue.push(NodesDelta::new().with_add(vec![Node::new(id)]));
//! }
//!
//! assert_eq!(queue.len(), 2);
//! assert_eq!(queue.pop_oldest().unwrap().added().len(), 2);
//! ```

pub mod queue;

pub use queue::{DeltaQueue, PushOutcome, SeqNo, TaggedDelta, DEFAULT_CAPACITY};
