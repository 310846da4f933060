//! Fixed-window request rate governor.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;

/// Source of monotonic time for window bookkeeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub admitted: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Per-(client, route) fixed-window counter table.
///
/// Rejection is a normal outcome, never an error. State lives in process
/// memory only: a restart clears it and separate instances count
/// independently.
pub struct RateGovernor {
    windows: DashMap<String, WindowEntry>,
    enforce: bool,
    clock: Arc<dyn Clock>,
}

impl RateGovernor {
    /// `enforce = false` admits every request (development mode).
    pub fn new(enforce: bool) -> Self {
        Self::with_clock(enforce, Arc::new(SystemClock))
    }

    pub fn with_clock(enforce: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            enforce,
            clock,
        }
    }

    pub fn is_enforcing(&self) -> bool {
        self.enforce
    }

    /// Count one request for `client_id` on `route_path` and decide whether
    /// to admit it.
    pub fn check_and_admit(
        &self,
        client_id: &str,
        route_path: &str,
        limit: u32,
        window: Duration,
    ) -> RateDecision {
        if !self.enforce {
            return RateDecision {
                admitted: true,
                remaining: limit,
                reset_after: window,
            };
        }

        let now = self.clock.now();
        self.sweep(now, window);

        if limit == 0 {
            return RateDecision {
                admitted: false,
                remaining: 0,
                reset_after: window,
            };
        }

        let key = format!("{client_id}:{route_path}");
        // The entry guard holds the shard lock across check-and-increment.
        let mut entry = self.windows.entry(key).or_insert(WindowEntry {
            count: 0,
            reset_at: now,
        });

        if entry.count == 0 || now >= entry.reset_at {
            *entry = WindowEntry {
                count: 1,
                reset_at: now + window,
            };
            return RateDecision {
                admitted: true,
                remaining: limit - 1,
                reset_after: window,
            };
        }

        let reset_after = entry.reset_at.saturating_duration_since(now);
        if entry.count < limit {
            entry.count += 1;
            RateDecision {
                admitted: true,
                remaining: limit - entry.count,
                reset_after,
            }
        } else {
            RateDecision {
                admitted: false,
                remaining: 0,
                reset_after,
            }
        }
    }

    /// Drop entries whose window ended more than one `window` ago.
    fn sweep(&self, now: Instant, window: Duration) {
        self.windows.retain(|_, e| match now.checked_sub(window) {
            Some(horizon) => e.reset_at >= horizon,
            None => true,
        });
        metrics::record_rate_table_size(self.windows.len());
    }

    /// Number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
