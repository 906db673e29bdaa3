//! Single-shot, cancellable drain timer.
//!
//! The scheduler does not loop on its own. Whoever handles a firing decides
//! whether to re-arm it, which keeps the pause check at every step:
//!
//! ```text
//! Idle ──arm──▶ Pending{epoch} ──fires──▶ claim(epoch) ──▶ Idle
//!                    │
//!                    └──cancel / re-arm──▶ Idle (task aborted)
//! ```
//!
//! Every arming gets a fresh epoch. A task that already woke up when it was
//! cancelled still calls back, but `claim` rejects its stale epoch.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

enum DrainTimer {
    Idle,
    Pending { epoch: u64, handle: JoinHandle<()> },
}

/// At most one outstanding drain timer.
pub struct DrainScheduler {
    interval: Duration,
    epoch: u64,
    timer: DrainTimer,
}

impl DrainScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            epoch: 0,
            timer: DrainTimer::Idle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True while a timer is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self.timer, DrainTimer::Pending { .. })
    }

    /// Cancel the outstanding timer, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match std::mem::replace(&mut self.timer, DrainTimer::Idle) {
            DrainTimer::Pending { handle, .. } => {
                handle.abort();
                true
            }
            DrainTimer::Idle => false,
        }
    }

    /// Run `on_fire(epoch)` once after the interval, replacing any
    /// outstanding timer.
    pub fn arm<F>(&mut self, runtime: &Handle, on_fire: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.epoch += 1;
        let epoch = self.epoch;
        let interval = self.interval;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            on_fire(epoch);
        });
        self.timer = DrainTimer::Pending { epoch, handle };
    }

    /// Accept a firing timer. Returns false for a timer that has since been
    /// cancelled or replaced; otherwise the scheduler goes back to idle.
    pub fn claim(&mut self, epoch: u64) -> bool {
        let current = matches!(self.timer, DrainTimer::Pending { epoch: e, .. } if e == epoch);
        if current {
            // the claiming task is the one running; just detach it
            self.timer = DrainTimer::Idle;
        }
        current
    }
}

impl Drop for DrainScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for DrainScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainScheduler")
            .field("interval", &self.interval)
            .field("epoch", &self.epoch)
            .field("pending", &self.is_pending())
            .finish()
    }
}
