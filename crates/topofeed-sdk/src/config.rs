//! Feed configuration.

use crate::error::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use topofeed_queue::DEFAULT_CAPACITY;

/// Default pause between two drained deltas (in milliseconds).
pub const DEFAULT_FEED_INTERVAL_MS: u64 = 1000;

/// Configuration for a buffering controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Maximum number of held deltas before the oldest pair is consolidated.
    pub capacity: usize,
    /// Delay between two deltas emitted while catching up (in milliseconds).
    pub feed_interval_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            feed_interval_ms: DEFAULT_FEED_INTERVAL_MS,
        }
    }
}

impl FeedConfig {
    pub fn feed_interval(&self) -> Duration {
        Duration::from_millis(self.feed_interval_ms)
    }

    /// Check the values a controller relies on.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(FeedError::InvalidConfig(format!(
                "capacity must be at least 2, got {}",
                self.capacity
            )));
        }
        if self.feed_interval_ms == 0 {
            return Err(FeedError::InvalidConfig(
                "feed interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for feed configuration.
pub struct FeedConfigBuilder {
    config: FeedConfig,
}

impl FeedConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FeedConfig::default(),
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn feed_interval(mut self, ms: u64) -> Self {
        self.config.feed_interval_ms = ms;
        self
    }

    pub fn build(self) -> FeedConfig {
        self.config
    }
}

impl Default for FeedConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
