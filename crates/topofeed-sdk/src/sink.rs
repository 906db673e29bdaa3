//! Consumer-side sinks that receive deltas in order.

use crate::error::{FeedError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use topofeed_core::NodesDelta;

/// Receiver of deltas, usually the graph-rendering layer.
///
/// Deltas arrive one at a time, in arrival order.
pub trait DeltaSink: Send + Sync + 'static {
    fn emit(&self, delta: NodesDelta) -> Result<()>;
}

/// Sink backed by an unbounded tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<NodesDelta>,
}

impl ChannelSink {
    /// Create a sink and the receiver the consumer reads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NodesDelta>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DeltaSink for ChannelSink {
    fn emit(&self, delta: NodesDelta) -> Result<()> {
        self.tx.send(delta).map_err(|_| FeedError::SinkClosed)
    }
}

/// In-memory sink for testing and simulation.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    received: Arc<Mutex<Vec<NodesDelta>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, in order.
    pub fn received(&self) -> Vec<NodesDelta> {
        self.received.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.received.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.lock().is_empty()
    }

    /// Take everything received so far.
    pub fn take(&self) -> Vec<NodesDelta> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl DeltaSink for MemorySink {
    fn emit(&self, delta: NodesDelta) -> Result<()> {
        self.received.lock().push(delta);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topofeed_core::Node;

    #[tokio::test]
    async fn test_channel_sink() {
        let (sink, mut rx) = ChannelSink::new();
        let delta = NodesDelta::new().with_add(vec![Node::new("a")]);

        sink.emit(delta.clone()).unwrap();
        assert_eq!(rx.recv().await, Some(delta.clone()));

        drop(rx);
        assert_eq!(sink.emit(delta), Err(FeedError::SinkClosed));
    }

    #[test]
    fn test_memory_sink_clones_share_storage() {
        let sink = MemorySink::new();
        let observer = sink.clone();

        sink.emit(NodesDelta::new().with_remove(["a"])).unwrap();
        assert_eq!(observer.len(), 1);
        assert_eq!(observer.take().len(), 1);
        assert!(sink.is_empty());
    }
}
