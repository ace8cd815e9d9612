//! Fixed per-window call budget

use comet_common::{CometError, Result};
use parking_lot::Mutex;
use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Counts remote calls and refuses any call past `limit` within a tracking window.
///
/// The counter never advances past `limit`. It resets at the first call made
/// after the window has elapsed, or on [`CallBudget::reset`].
#[derive(Debug)]
pub struct CallBudget {
    limit: u32,
    window: Duration,
    used: AtomicU32,
    window_start: Mutex<Instant>,
}

impl CallBudget {
    /// Budget of `limit` calls per `window`
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            used: AtomicU32::new(0),
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// Reserve one call, returning the number of calls used in this window.
    ///
    /// Fails with [`CometError::RateLimitExceeded`] once the budget is spent.
    pub fn try_acquire(&self) -> Result<u32> {
        self.roll_window();

        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|used| {
                warn!(used, limit = self.limit, "API call budget exhausted");
                CometError::RateLimitExceeded {
                    used,
                    limit: self.limit,
                }
            })
    }

    /// Calls used in the current window
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Acquire)
    }

    /// Maximum calls per window
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Tracking window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether the next call would be refused
    pub fn is_exhausted(&self) -> bool {
        self.used() >= self.limit
    }

    /// Start a fresh window now
    pub fn reset(&self) {
        let mut start = self.window_start.lock();
        *start = Instant::now();
        self.used.store(0, Ordering::Release);
        debug!("API call budget reset");
    }

    fn roll_window(&self) {
        let mut start = self.window_start.lock();
        if start.elapsed() >= self.window {
            *start = Instant::now();
            self.used.store(0, Ordering::Release);
            debug!("API call budget window rolled over");
        }
    }
}
