//! Topofeed SDK - feeding live graph deltas to a pausable view
//!
//! A topology source produces node deltas continuously. The consumer, a
//! graph view, can pause. While paused the view must not change, but no delta
//! may be lost. On resume the held deltas are replayed at a steady pace
//! instead of in one burst.
//!
//! # Quick Start
//!
//! ```rust
//! use topofeed_sdk::prelude::*;
//! use topofeed_sdk::{Node, NodesDelta};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (sink, mut rx) = ChannelSink::new();
//!     let config = FeedConfigBuilder::new().feed_interval(500).build();
//!     let feed = BufferController::new(sink, config).unwrap();
//!
//!     // live: delivered immediately
//!     feed.on_delta_received(NodesDelta::new().with_add(vec![Node::new("web-1")]));
//!     assert!(rx.recv().await.is_some());
//!
//!     // paused: held back until resume
//!     feed.pause();
//!     feed.on_delta_received(NodesDelta::new().with_remove(["web-1"]));
//!     assert_eq!(feed.buffered_len(), 1);
//!
//!     feed.resume();
//!     assert!(rx.recv().await.is_some());
//! }
//! ```
//!
//! # Architecture
//!
//! - [`controller`] - Entry point deciding per delta whether to deliver or hold
//! - [`scheduler`] - Cancellable single-shot timer pacing the replay
//! - [`pause`] - Shared pause flag with its timestamp
//! - [`sink`] - Consumer-side delivery abstractions
//! - [`config`] - Capacity and cadence settings
//! - [`event`] - Events and counters for diagnostics
//! - [`error`] - Error types

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod pause;
pub mod scheduler;
pub mod sink;

// Re-exports for convenience
pub use config::{FeedConfig, FeedConfigBuilder, DEFAULT_FEED_INTERVAL_MS};
pub use controller::BufferController;
pub use error::{FeedError, Result};
pub use event::{FeedEvent, FeedStats};
pub use pause::PauseState;
pub use scheduler::DrainScheduler;
pub use sink::{ChannelSink, DeltaSink, MemorySink};

pub use topofeed_core::{Consolidate, Node, NodeId, NodesDelta};
pub use topofeed_queue::{DeltaQueue, PushOutcome, DEFAULT_CAPACITY};

/// Decode one delta from its JSON wire form.
pub fn decode_delta(raw: &str) -> Result<NodesDelta> {
    Ok(serde_json::from_str(raw)?)
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{FeedConfig, FeedConfigBuilder};
    pub use crate::controller::BufferController;
    pub use crate::error::FeedError;
    pub use crate::event::FeedEvent;
    pub use crate::pause::PauseState;
    pub use crate::sink::{ChannelSink, DeltaSink, MemorySink};
}
