//! Global request pacing.
//!
//! A single [`IntervalLimiter`] is shared by every worker; `wait()` blocks
//! until at least the configured interval has elapsed since the previous
//! `wait()` returned. Only one request proceeds per interval window no matter
//! how many workers are active, which trades throughput for a bounded,
//! registry-friendly outbound rate.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval rate limiter shared across workers.
pub struct IntervalLimiter {
    interval: Duration,
    // Time the previous wait() returned. Held across the sleep so callers
    // queue up behind one another rather than racing the clock.
    last: Mutex<Option<Instant>>,
}

impl IntervalLimiter {
    /// Creates a limiter with the given minimum inter-call interval in
    /// seconds. Zero or negative disables pacing entirely.
    pub fn new(throttle_seconds: f64) -> Self {
        let interval = if throttle_seconds > 0.0 {
            Duration::from_secs_f64(throttle_seconds)
        } else {
            Duration::ZERO
        };
        IntervalLimiter {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Blocks until at least the interval has elapsed since the previous
    /// `wait()` returned. Returns immediately when pacing is disabled.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
