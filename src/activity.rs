//! In-flight request tracking
//!
//! A single loading indicator is shown while any request is in flight, no
//! matter how many overlap. The count and the indicator transitions are
//! updated under one lock so `show`/`hide` calls can never be reordered.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// Receiver of busy/idle transitions (a spinner, a status line, ...)
pub trait ActivityIndicator: Send + Sync {
    /// Called on the 0 -> 1 transition
    fn show(&self);

    /// Called when the count drops back to 0
    fn hide(&self);
}

/// Indicator that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndicator;

impl ActivityIndicator for NoopIndicator {
    fn show(&self) {}

    fn hide(&self) {}
}

/// Indicator that reports transitions through tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct LogIndicator;

impl ActivityIndicator for LogIndicator {
    fn show(&self) {
        tracing::info!("Loading...");
    }

    fn hide(&self) {
        tracing::info!("Done");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Idle,
    Busy,
}

pub struct ActivityTracker {
    in_flight: Mutex<usize>,
    indicator: Arc<dyn ActivityIndicator>,
}

impl ActivityTracker {
    pub fn new(indicator: Arc<dyn ActivityIndicator>) -> Self {
        Self {
            in_flight: Mutex::new(0),
            indicator,
        }
    }

    pub fn noop() -> Self {
        Self::new(Arc::new(NoopIndicator))
    }

    fn count(&self) -> MutexGuard<'_, usize> {
        // the counter stays consistent even if an indicator panicked mid-update
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn on_request_start(&self) {
        let mut count = self.count();
        *count += 1;
        trace!(in_flight = *count, "Request started");

        if *count == 1 {
            debug!("Activity: idle -> busy");
            self.indicator.show();
        }
    }

    pub fn on_request_end(&self) {
        let mut count = self.count();
        if *count == 0 {
            trace!("Request end with nothing in flight, ignoring");
            return;
        }

        *count -= 1;
        trace!(in_flight = *count, "Request finished");

        if *count == 0 {
            debug!("Activity: busy -> idle");
            self.indicator.hide();
        }
    }

    /// Start tracking a request; the returned guard ends it on drop.
    pub fn begin(self: &Arc<Self>) -> ActivityGuard {
        self.on_request_start();
        ActivityGuard {
            tracker: Arc::clone(self),
        }
    }

    pub fn in_flight(&self) -> usize {
        *self.count()
    }

    pub fn state(&self) -> ActivityState {
        if self.in_flight() == 0 {
            ActivityState::Idle
        } else {
            ActivityState::Busy
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state() == ActivityState::Busy
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::noop()
    }
}

/// Marks one in-flight request; released on every exit path, including
/// early returns, panics and dropped futures.
#[must_use = "dropping the guard immediately ends the request"]
pub struct ActivityGuard {
    tracker: Arc<ActivityTracker>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.tracker.on_request_end();
    }
}
