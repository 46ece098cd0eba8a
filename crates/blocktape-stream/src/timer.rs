//! Tick scheduling.
//!
//! The session manager drives its tick loop from a [`TickTimer`]. Production
//! code uses [`TokioTimer`]; tests use [`ManualTimer`], which never fires, and
//! call `tick()` on the manager themselves.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Source of periodic ticks.
#[async_trait]
pub trait TickTimer: Send + Sync {
    /// Waits for the next tick. Returns false once cancelled.
    async fn next_tick(&self) -> bool;

    /// Stops the timer; pending and future `next_tick` calls return false.
    fn cancel(&self);

    /// Re-arms a cancelled timer for a new session.
    fn reset(&self);
}

/// Interval timer on the tokio clock. Missed ticks are skipped, not bunched.
#[derive(Debug)]
pub struct TokioTimer {
    period: Duration,
    interval: Mutex<Option<Interval>>,
    cancelled: watch::Sender<bool>,
}

impl TokioTimer {
    pub fn new(period: Duration) -> Self {
        let (cancelled, _) = watch::channel(false);
        Self {
            period,
            interval: Mutex::new(None),
            cancelled,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl TickTimer for TokioTimer {
    async fn next_tick(&self) -> bool {
        let mut cancelled = self.cancelled.subscribe();
        if *cancelled.borrow_and_update() {
            return false;
        }

        let mut guard = self.interval.lock().await;
        let interval = guard.get_or_insert_with(|| {
            // First tick one period from now, not immediately.
            let mut interval = interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        tokio::select! {
            _ = interval.tick() => true,
            _ = cancelled.changed() => false,
        }
    }

    fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    fn reset(&self) {
        if let Ok(mut guard) = self.interval.try_lock() {
            *guard = None;
        }
        self.cancelled.send_replace(false);
    }
}

/// Timer that never fires on its own.
#[derive(Debug)]
pub struct ManualTimer {
    cancelled: watch::Sender<bool>,
}

impl ManualTimer {
    pub fn new() -> Self {
        let (cancelled, _) = watch::channel(false);
        Self { cancelled }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickTimer for ManualTimer {
    async fn next_tick(&self) -> bool {
        let mut cancelled = self.cancelled.subscribe();
        while !*cancelled.borrow_and_update() {
            if cancelled.changed().await.is_err() {
                break;
            }
        }
        false
    }

    fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    fn reset(&self) {
        self.cancelled.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_ticks_after_period() {
        let timer = TokioTimer::new(Duration::from_secs(30));
        let start = Instant::now();
        assert!(timer.next_tick().await);
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(timer.next_tick().await);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_cancel_and_reset() {
        let timer = std::sync::Arc::new(TokioTimer::new(Duration::from_secs(30)));
        let waiter = {
            let timer = timer.clone();
            tokio::spawn(async move { timer.next_tick().await })
        };
        tokio::task::yield_now().await;
        timer.cancel();
        assert!(!waiter.await.unwrap());
        assert!(!timer.next_tick().await);

        timer.reset();
        assert!(timer.next_tick().await);
    }

    #[tokio::test]
    async fn test_manual_timer_only_ends() {
        let timer = std::sync::Arc::new(ManualTimer::new());
        let waiter = {
            let timer = timer.clone();
            tokio::spawn(async move { timer.next_tick().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        timer.cancel();
        assert!(!waiter.await.unwrap());
        assert!(timer.is_cancelled());
    }
}
