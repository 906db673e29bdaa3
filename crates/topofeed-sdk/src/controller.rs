//! Pause-aware buffering controller.
//!
//! Every delta from the topology source goes through
//! [`BufferController::on_delta_received`]:
//!
//! ```text
//! delta ─▶ empty? ──yes──▶ drop
//!            │no
//!            ▼
//!   paused or backlog? ──yes──▶ DeltaQueue.push ─▶ (consolidate when full)
//!            │no
//!            ▼
//!       sink.emit(delta)
//! ```
//!
//! After `resume`, the backlog is replayed one delta per feed interval until
//! the queue is empty or the view is paused again.

use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use crate::event::{FeedEvent, FeedStats};
use crate::pause::PauseState;
use crate::scheduler::DrainScheduler;
use crate::sink::DeltaSink;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use topofeed_core::{Consolidate, NodesDelta};
use topofeed_queue::{DeltaQueue, PushOutcome};
use tracing::{debug, info, warn};

/// Queue, timer and counters; only ever touched under one lock.
struct EngineState {
    queue: DeltaQueue<NodesDelta>,
    scheduler: DrainScheduler,
    stats: FeedStats,
}

/// Lock order is `delivery` then `state`. The sink is only called while
/// `delivery` is held and `state` is not, so a sink may call back into the
/// controller.
struct Shared<S: DeltaSink> {
    state: Mutex<EngineState>,
    delivery: ReentrantMutex<()>,
    pause: PauseState,
    sink: S,
    runtime: Handle,
    config: FeedConfig,
    event_tx: broadcast::Sender<FeedEvent>,
}

impl<S: DeltaSink> Shared<S> {
    fn notify(&self, event: FeedEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Hand a delta to the sink. Must not be called with `state` locked.
    fn emit(&self, delta: NodesDelta) -> bool {
        match self.sink.emit(delta) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Consumer refused nodes delta");
                self.state.lock().stats.emit_failures += 1;
                self.notify(FeedEvent::EmitFailed);
                false
            }
        }
    }

    /// Deliver the oldest held delta and re-arm the timer if more remain.
    fn drain_step(shared: &Arc<Self>) {
        let _delivery = shared.delivery.lock();
        let next = {
            let mut state = shared.state.lock();
            state.scheduler.cancel();
            if shared.pause.is_paused() {
                debug!(size = state.queue.len(), "Paused, drain going idle");
                return;
            }
            state.queue.pop_oldest()
        };

        if let Some(delta) = next {
            if shared.emit(delta) {
                let mut state = shared.state.lock();
                state.stats.drained += 1;
                let remaining = state.queue.len();
                drop(state);
                shared.notify(FeedEvent::Drained { remaining });
            }
        }

        let mut state = shared.state.lock();
        // a sink calling `resume` may already have armed the next step
        if !state.queue.is_empty() && !state.scheduler.is_pending() {
            let weak = Arc::downgrade(shared);
            state.scheduler.arm(&shared.runtime, move |epoch| {
                if let Some(shared) = weak.upgrade() {
                    Shared::on_timer(&shared, epoch);
                }
            });
        }
    }

    fn on_timer(shared: &Arc<Self>, epoch: u64) {
        let _delivery = shared.delivery.lock();
        if !shared.state.lock().scheduler.claim(epoch) {
            return;
        }
        Shared::drain_step(shared);
    }
}

/// Entry point of the feed: decides per delta whether to deliver or hold it.
///
/// Cloning gives another handle to the same controller. Independent
/// controllers share nothing.
///
/// # Example
///
/// ```rust
/// use topofeed_core::{Node, NodesDelta};
/// use topofeed_sdk::{BufferController, FeedConfig, MemorySink};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let sink = MemorySink::new();
///     let feed = BufferController::new(sink.clone(), FeedConfig::default()).unwrap();
///
///     feed.pause();
///     feed.on_delta_received(NodesDelta::new().with_add(vec![Node::new("a")]));
///     assert!(sink.is_empty());
///     assert_eq!(feed.buffered_len(), 1);
///
///     feed.resume();
///     assert_eq!(sink.len(), 1);
/// }
/// ```
pub struct BufferController<S: DeltaSink> {
    shared: Arc<Shared<S>>,
}

impl<S: DeltaSink> Clone for BufferController<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: DeltaSink> BufferController<S> {
    /// Create a controller with its own, unpaused pause state.
    ///
    /// Must be called from within a tokio runtime, which drives the drain
    /// timer.
    pub fn new(sink: S, config: FeedConfig) -> Result<Self> {
        Self::with_pause_state(sink, config, PauseState::new())
    }

    /// Create a controller reading an existing pause state.
    pub fn with_pause_state(sink: S, config: FeedConfig, pause: PauseState) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| FeedError::NoRuntime)?;
        let (event_tx, _) = broadcast::channel(100);

        let state = EngineState {
            queue: DeltaQueue::new(config.capacity),
            scheduler: DrainScheduler::new(config.feed_interval()),
            stats: FeedStats::default(),
        };

        Ok(Self {
            shared: Arc::new(Shared {
                delivery: ReentrantMutex::new(()),
                state: Mutex::new(state),
                pause,
                sink,
                runtime,
                config,
                event_tx,
            }),
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.shared.config
    }

    pub fn pause_state(&self) -> &PauseState {
        &self.shared.pause
    }

    pub fn is_paused(&self) -> bool {
        self.shared.pause.is_paused()
    }

    /// Subscribe to feed events.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Number of deltas currently held back.
    pub fn buffered_len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// True while a drain timer is outstanding.
    pub fn is_draining(&self) -> bool {
        self.shared.state.lock().scheduler.is_pending()
    }

    pub fn stats(&self) -> FeedStats {
        let state = self.shared.state.lock();
        FeedStats {
            consolidations: state.queue.consolidations(),
            ..state.stats
        }
    }

    /// Handle a delta from the topology source.
    ///
    /// While the view is live and nothing is held back, the delta goes
    /// straight to the sink. While paused, or while an older backlog is
    /// still being replayed, it joins the queue so arrival order holds.
    pub fn on_delta_received(&self, delta: NodesDelta) {
        let shared = &self.shared;
        let delta = delta.canonicalize();
        let _delivery = shared.delivery.lock();
        let mut state = shared.state.lock();

        if delta.is_degenerate() {
            debug!("Discarding empty nodes delta");
            state.stats.discarded += 1;
            shared.notify(FeedEvent::Discarded);
            return;
        }

        let paused = shared.pause.is_paused();
        if !paused && state.queue.is_empty() {
            drop(state);
            if shared.emit(delta) {
                shared.state.lock().stats.passed += 1;
                shared.notify(FeedEvent::Passed);
            }
            return;
        }

        let outcome = state.queue.push(delta);
        state.stats.buffered += 1;
        let size = state.queue.len();
        if outcome == PushOutcome::Consolidated {
            shared.notify(FeedEvent::Consolidated { size });
        }
        shared.notify(FeedEvent::Buffered { size });

        // live again but behind: make sure the backlog keeps moving
        let stalled = !paused && !state.scheduler.is_pending();
        drop(state);
        if stalled {
            Shared::drain_step(shared);
        }
    }

    /// Freeze the consumer's view. Incoming deltas are held from now on.
    pub fn pause(&self) {
        if self.shared.pause.pause() {
            info!("Pausing graph updates");
            self.shared.notify(FeedEvent::Paused);
        }
    }

    /// Unfreeze the view and start replaying held deltas.
    ///
    /// The oldest held delta is delivered right away; the rest follow one
    /// per feed interval.
    pub fn resume(&self) {
        let shared = &self.shared;
        let paused_at = shared.pause.resume();
        let buffered = self.buffered_len();

        info!(?paused_at, buffered, "Resuming graph updates");
        shared.notify(FeedEvent::Resumed { buffered });
        Shared::drain_step(shared);
    }

    /// Drop every held delta and cancel any pending drain. The pause state
    /// is left as it is. Returns how many deltas were dropped.
    pub fn reset(&self) -> usize {
        let mut state = self.shared.state.lock();
        let cancelled = state.scheduler.cancel();
        let dropped = state.queue.clear();
        state.stats.resets += 1;

        info!(dropped, cancelled, "Reset update buffer");
        self.shared.notify(FeedEvent::Reset { dropped });
        dropped
    }

    /// Reset because the consumer switched to another view context (for
    /// example another topology), where held deltas no longer apply.
    pub fn switch_context(&self, context: &str) -> usize {
        info!(context, "Switching view context");
        self.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfigBuilder;
    use crate::sink::{ChannelSink, MemorySink};
    use std::time::Duration;
    use topofeed_core::Node;

    fn add(id: &str) -> NodesDelta {
        NodesDelta::new().with_add(vec![Node::new(id)])
    }

    fn controller(sink: &MemorySink) -> BufferController<MemorySink> {
        BufferController::new(sink.clone(), FeedConfig::default()).unwrap()
    }

    #[test]
    fn test_requires_runtime() {
        let result = BufferController::new(MemorySink::new(), FeedConfig::default());
        assert!(matches!(result, Err(FeedError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let config = FeedConfigBuilder::new().capacity(1).build();
        let result = BufferController::new(MemorySink::new(), config);
        assert!(matches!(result, Err(FeedError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_unpaused_passes_through() {
        let sink = MemorySink::new();
        let feed = controller(&sink);

        feed.on_delta_received(add("a"));
        feed.on_delta_received(add("b"));

        assert_eq!(sink.received(), vec![add("a"), add("b")]);
        assert_eq!(feed.buffered_len(), 0);
        assert_eq!(feed.stats().passed, 2);
    }

    #[tokio::test]
    async fn test_degenerate_is_dropped() {
        let sink = MemorySink::new();
        let feed = controller(&sink);

        feed.on_delta_received(NodesDelta::new());
        feed.pause();
        feed.on_delta_received(NodesDelta::new().with_update(vec![]));

        assert!(sink.is_empty());
        assert_eq!(feed.buffered_len(), 0);
        assert_eq!(feed.stats().discarded, 2);
    }

    #[tokio::test]
    async fn test_paused_holds_deltas() {
        let sink = MemorySink::new();
        let feed = controller(&sink);

        feed.pause();
        feed.on_delta_received(add("a"));
        feed.on_delta_received(add("b"));

        assert!(sink.is_empty());
        assert_eq!(feed.buffered_len(), 2);
        assert!(!feed.is_draining());
    }

    #[tokio::test]
    async fn test_incoming_duplicates_are_canonicalized() {
        let sink = MemorySink::new();
        let feed = controller(&sink);

        feed.on_delta_received(
            NodesDelta::new()
                .with_add(vec![Node::new("a"), Node::new("a").with_attr("v", 2)])
                .with_remove(Vec::<String>::new()),
        );

        let received = sink.received();
        assert_eq!(received[0].added().len(), 1);
        assert!(received[0].remove.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_emits_first_immediately() {
        let sink = MemorySink::new();
        let feed = controller(&sink);

        feed.pause();
        assert!(feed.is_paused());
        feed.on_delta_received(add("a"));
        feed.on_delta_received(add("b"));

        feed.resume();
        assert!(!feed.is_paused());
        assert_eq!(sink.received(), vec![add("a")]);
        assert!(feed.is_draining());

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(sink.received(), vec![add("a"), add("b")]);
        assert!(!feed.is_draining());
    }

    #[tokio::test]
    async fn test_closed_sink_is_counted_not_raised() {
        let (sink, rx) = ChannelSink::new();
        let feed = BufferController::new(sink, FeedConfig::default()).unwrap();
        let mut events = feed.subscribe();
        drop(rx);

        feed.on_delta_received(add("a"));

        assert_eq!(feed.stats().emit_failures, 1);
        assert_eq!(events.try_recv().unwrap(), FeedEvent::EmitFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_drain_is_not_counted_as_drained() {
        let (sink, rx) = ChannelSink::new();
        let feed = BufferController::new(sink, FeedConfig::default()).unwrap();

        feed.pause();
        feed.on_delta_received(add("a"));
        feed.on_delta_received(add("b"));
        drop(rx);

        feed.resume();
        tokio::time::sleep(Duration::from_millis(1001)).await;

        let stats = feed.stats();
        assert_eq!(stats.drained, 0);
        assert_eq!(stats.emit_failures, 2);
        assert_eq!(feed.buffered_len(), 0);
    }

    /// Records every delta with the backlog size it saw, and answers a
    /// "ping" by sending a "pong" through the same controller.
    #[derive(Clone, Default)]
    struct ObservingSink {
        feed: Arc<Mutex<Option<BufferController<ObservingSink>>>>,
        seen: Arc<Mutex<Vec<(NodesDelta, usize)>>>,
    }

    impl DeltaSink for ObservingSink {
        fn emit(&self, delta: NodesDelta) -> Result<()> {
            let feed = self.feed.lock().clone();
            if let Some(feed) = feed {
                let held = feed.buffered_len();
                let _ = feed.stats();
                let _ = feed.is_draining();
                let ping = delta == add("ping");
                self.seen.lock().push((delta, held));
                if ping {
                    feed.on_delta_received(add("pong"));
                }
            }
            Ok(())
        }
    }

    fn observed() -> (ObservingSink, BufferController<ObservingSink>) {
        let sink = ObservingSink::default();
        let feed = BufferController::new(sink.clone(), FeedConfig::default()).unwrap();
        *sink.feed.lock() = Some(feed.clone());
        (sink, feed)
    }

    #[tokio::test]
    async fn test_sink_may_call_back_on_pass_through() {
        let (sink, feed) = observed();

        feed.on_delta_received(add("a"));
        feed.on_delta_received(add("ping"));

        let seen = sink.seen.lock().clone();
        assert_eq!(seen, vec![(add("a"), 0), (add("ping"), 0), (add("pong"), 0)]);
        assert_eq!(feed.stats().passed, 3);
        sink.feed.lock().take();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_may_call_back_while_draining() {
        let (sink, feed) = observed();

        feed.pause();
        for id in ["a", "b", "c"] {
            feed.on_delta_received(add(id));
        }
        feed.resume();
        tokio::time::sleep(Duration::from_millis(2001)).await;

        let seen = sink.seen.lock().clone();
        assert_eq!(seen, vec![(add("a"), 2), (add("b"), 1), (add("c"), 0)]);
        assert_eq!(feed.stats().drained, 3);
        assert!(!feed.is_draining());
        sink.feed.lock().take();
    }

    #[tokio::test]
    async fn test_events() {
        let sink = MemorySink::new();
        let config = FeedConfigBuilder::new().capacity(2).build();
        let feed = BufferController::new(sink.clone(), config).unwrap();
        let mut events = feed.subscribe();

        feed.pause();
        feed.on_delta_received(add("a"));
        feed.on_delta_received(add("b"));
        feed.on_delta_received(add("c"));
        feed.reset();

        let received: Vec<FeedEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(
            received,
            vec![
                FeedEvent::Paused,
                FeedEvent::Buffered { size: 1 },
                FeedEvent::Buffered { size: 2 },
                FeedEvent::Consolidated { size: 2 },
                FeedEvent::Buffered { size: 2 },
                FeedEvent::Reset { dropped: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_switch_context_keeps_pause() {
        let sink = MemorySink::new();
        let feed = controller(&sink);

        feed.pause();
        feed.on_delta_received(add("a"));
        assert_eq!(feed.switch_context("containers"), 1);

        assert!(feed.is_paused());
        assert_eq!(feed.buffered_len(), 0);
        assert_eq!(feed.stats().resets, 1);
    }
}
