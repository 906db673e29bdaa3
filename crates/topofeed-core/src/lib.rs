//! Topofeed Core - node delta records and their consolidation rules
//!
//! A [`NodesDelta`] describes one batch of graph changes observed between two
//! points in time: nodes added, nodes updated and node ids removed. Two
//! chronologically ordered deltas can be folded into one equivalent delta with
//! [`merge`], which is what the bounded queue relies on when it runs out of
//! room.

pub mod consolidate;
pub mod delta;
pub mod merge;

pub use consolidate::Consolidate;
pub use delta::{Node, NodeId, NodesDelta};
pub use merge::merge;
