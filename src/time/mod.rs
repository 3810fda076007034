//! Monotonic time sources
//!
//! The probe only ever needs a monotonic "now" for send timestamps and
//! deadlines. Timestamps are [`tokio::time::Instant`] so that tests running
//! on a paused tokio clock see consistent time everywhere.
//!
//! - [`SystemClock`] follows the tokio clock (and therefore the OS monotonic
//!   clock outside of paused tests)
//! - [`ManualClock`] only moves when told to, for deterministic tests and
//!   simulations

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Source of monotonic timestamps
pub trait Clock: Send + Sync {
    /// Returns the current instant
    fn now(&self) -> Instant;
}

/// Clock backed by the tokio time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that advances only through [`ManualClock::advance`]
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl ManualClock {
    /// Creates a clock frozen at `start`
    pub fn new(start: Instant) -> Self {
        ManualClock {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_only_on_request() {
        let clock = ManualClock::default();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));

        // clones share the same time
        let other = clock.clone();
        other.advance(Duration::from_millis(750));
        assert_eq!(clock.now() - start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_follows_tokio_time() {
        let clock = SystemClock;
        let start = clock.now();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(clock.now() - start >= Duration::from_secs(5));
    }
}
