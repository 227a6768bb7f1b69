//! Periodic refresh timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Marker sent on every timer expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick;

/// Single owned timer. The task handle is the only running state, so
/// `restart()` and `stop()` are idempotent from any caller.
#[derive(Debug)]
pub struct RefreshTimer {
    period: Duration,
    ticks: mpsc::UnboundedSender<TimerTick>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    pub fn new(period: Duration, ticks: mpsc::UnboundedSender<TimerTick>) -> Self {
        Self {
            period,
            ticks,
            handle: None,
        }
    }

    /// Start a fresh cycle; the next tick is one full period from now.
    /// Must be called from within a tokio runtime.
    pub fn restart(&mut self) {
        self.stop();
        let period = self.period;
        let first = Instant::now() + period;
        let ticks = self.ticks.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if ticks.send(TimerTick).is_err() {
                    break;
                }
            }
        }));
        debug!(period_ms = period.as_millis() as u64, "[REFRESH] timer restarted");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(rx: &mut mpsc::UnboundedReceiver<TimerTick>) -> usize {
        tokio::task::yield_now().await;
        let mut n = 0;
        while rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = RefreshTimer::new(Duration::from_secs(1), tx);
        timer.restart();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(drain(&mut rx).await, 0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(drain(&mut rx).await, 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(drain(&mut rx).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_phase() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = RefreshTimer::new(Duration::from_secs(1), tx);
        timer.restart();
        tokio::time::sleep(Duration::from_millis(800)).await;
        timer.restart();
        timer.restart();
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(drain(&mut rx).await, 0);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(drain(&mut rx).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = RefreshTimer::new(Duration::from_secs(1), tx);
        timer.stop();
        timer.restart();
        timer.stop();
        timer.stop();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(drain(&mut rx).await, 0);
    }
}
