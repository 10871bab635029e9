//! Wall-clock and cancellation checks for iterative runners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tracks a run's time limit and external cancellation flag.
///
/// Runners poll it at iteration boundaries.
#[derive(Debug, Clone)]
pub struct RunClock {
    started: Instant,
    limit: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl RunClock {
    pub fn new(time_limit_ms: Option<u64>, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self {
            started: Instant::now(),
            limit: time_limit_ms.map(Duration::from_millis),
            cancel,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn timed_out(&self) -> bool {
        self.limit.is_some_and(|limit| self.started.elapsed() >= limit)
    }

    /// Either condition that ends a run early.
    pub fn should_stop(&self) -> bool {
        self.cancelled() || self.timed_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_clock_never_stops() {
        let clock = RunClock::new(None, None);
        assert!(!clock.should_stop());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let clock = RunClock::new(None, Some(Arc::clone(&flag)));
        assert!(!clock.cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(clock.cancelled());
        assert!(clock.should_stop());
    }

    #[test]
    fn test_time_limit() {
        let clock = RunClock::new(Some(1), None);
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.timed_out());
    }
}
