//! Shared pause flag for the consumer's view.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// Whether the consumer currently wants its view frozen.
///
/// Cloning yields another handle to the same flag, so the UI layer can hold
/// one while the controller reads another.
#[derive(Clone, Debug, Default)]
pub struct PauseState {
    paused_at: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl PauseState {
    /// A new, unpaused state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.read().is_some()
    }

    /// When the view was paused, if it is.
    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        *self.paused_at.read()
    }

    /// Pause the view. Returns false if it was already paused, in which case
    /// the original timestamp is kept.
    pub fn pause(&self) -> bool {
        let mut paused_at = self.paused_at.write();
        if paused_at.is_some() {
            return false;
        }
        *paused_at = Some(Utc::now());
        true
    }

    /// Clear the pause. Returns the timestamp the view had been paused at.
    pub fn resume(&self) -> Option<DateTime<Utc>> {
        self.paused_at.write().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_lifecycle() {
        let state = PauseState::new();
        assert!(!state.is_paused());
        assert!(state.paused_at().is_none());

        assert!(state.pause());
        let first = state.paused_at().unwrap();
        assert!(!state.pause());
        assert_eq!(state.paused_at(), Some(first));

        assert_eq!(state.resume(), Some(first));
        assert!(!state.is_paused());
        assert_eq!(state.resume(), None);
    }

    #[test]
    fn test_handles_share_the_flag() {
        let ui = PauseState::new();
        let engine = ui.clone();

        ui.pause();
        assert!(engine.is_paused());
        engine.resume();
        assert!(!ui.is_paused());
    }
}
