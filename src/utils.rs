//! Miscellaneous helper utilities.

use std::time::Duration;

use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Leading-edge throttle: the first call in a window passes, the rest of the
/// window is swallowed.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn allow(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_collapse_into_one() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(1000));
        assert!(throttle.allow(start));
        assert!(!throttle.allow(start + Duration::from_millis(10)));
        assert!(!throttle.allow(start + Duration::from_millis(999)));
        assert!(throttle.allow(start + Duration::from_millis(1000)));
        assert!(!throttle.allow(start + Duration::from_millis(1500)));
    }

    #[test]
    fn late_periodic_triggers_pass_with_half_period_window() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(500));
        // a tick handled 10ms late must not swallow the next one
        for ms in [0, 1010, 2000, 3000, 4030, 5000] {
            assert!(throttle.allow(start + Duration::from_millis(ms)), "tick at {ms}ms");
        }
    }

    #[test]
    fn zero_window_never_throttles() {
        let now = Instant::now();
        let mut throttle = Throttle::new(Duration::ZERO);
        assert!(throttle.allow(now));
        assert!(throttle.allow(now));
    }
}
