//! Sample rate limiter
//!
//! Admits a frame only when `interval` has elapsed since the last admitted
//! one. Frames arriving in between are dropped, so the detector's load is
//! bounded independently of the source frame rate.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_admitted: Option<Instant>,
}

impl RateLimiter {
    /// `Duration::ZERO` admits every frame
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide whether a frame arriving at `now` passes
    pub fn admit(&mut self, now: Instant) -> bool {
        let due = match self.last_admitted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_admitted = Some(now);
        }
        due
    }
}
