use std::time::{Duration, Instant};

/// Tracks dispatch pacing for the fetch scheduler
///
/// The documentation host throttles aggressive clients, so consecutive
/// dispatches are kept at least `min_delay` apart.
#[derive(Debug, Clone)]
pub struct DispatchState {
    /// Number of fetches dispatched so far in this batch
    pub dispatch_count: u32,

    /// Timestamp of the last dispatch
    pub last_dispatch_time: Option<Instant>,

    /// Minimum time between two dispatches
    pub min_delay: Duration,
}

impl DispatchState {
    /// Creates a new DispatchState with the given minimum delay
    pub fn new(min_delay: Duration) -> Self {
        Self {
            dispatch_count: 0,
            last_dispatch_time: None,
            min_delay,
        }
    }

    /// Checks if a dispatch can happen at `now`
    pub fn can_dispatch(&self, now: Instant) -> bool {
        self.time_until_next_dispatch(now).is_none()
    }

    /// Records that a fetch was dispatched
    pub fn record_dispatch(&mut self, now: Instant) {
        self.dispatch_count += 1;
        self.last_dispatch_time = Some(now);
    }

    /// Calculates the time until the next dispatch may happen
    ///
    /// Returns None if a dispatch can happen now, or the duration to wait otherwise.
    pub fn time_until_next_dispatch(&self, now: Instant) -> Option<Duration> {
        if let Some(last) = self.last_dispatch_time {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_delay {
                return Some(self.min_delay - elapsed);
            }
        }
        None
    }
}
