//! Time as an effect.
//!
//! Every freshness window, settle delay and retry backoff in the client
//! goes through the [`Clock`] trait so that tests can drive time
//! deterministically. Production code uses [`SystemClock`]; tests use
//! [`SimulatedClock`], which only moves when `advance` is called.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;

/// Wall-clock effect used for timestamps and cooperative sleeps.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    async fn now_ms(&self) -> u64;

    /// Suspend the calling task for at least `ms` milliseconds.
    async fn sleep_ms(&self, ms: u64);
}

#[async_trait]
impl<T: Clock + ?Sized> Clock for Arc<T> {
    async fn now_ms(&self) -> u64 {
        (**self).now_ms().await
    }

    async fn sleep_ms(&self, ms: u64) {
        (**self).sleep_ms(ms).await
    }
}

/// Production clock backed by the system time and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for SystemClock {
    async fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }

    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

struct SimInner {
    now_ms: u64,
    sleepers: Vec<(u64, oneshot::Sender<()>)>,
}

/// Simulated clock for tests and simulation.
///
/// Sleeping tasks park on a oneshot channel and are woken when
/// [`SimulatedClock::advance`] moves simulated time past their deadline.
/// Time never moves on its own.
#[derive(Clone)]
pub struct SimulatedClock {
    inner: Arc<Mutex<SimInner>>,
}

impl SimulatedClock {
    /// Create a simulated clock starting at the given time.
    pub fn new(start_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimInner {
                now_ms: start_ms,
                sleepers: Vec::new(),
            })),
        }
    }

    /// Create a simulated clock starting at the Unix epoch.
    pub fn new_at_epoch() -> Self {
        Self::new(0)
    }

    /// Advance simulated time, waking every sleeper whose deadline passed.
    pub fn advance(&self, delta_ms: u64) {
        let due = {
            let mut inner = self.inner.lock();
            inner.now_ms += delta_ms;
            let now = inner.now_ms;
            let (due, rest) = inner
                .sleepers
                .drain(..)
                .partition::<Vec<_>, _>(|(deadline, _)| *deadline <= now);
            inner.sleepers = rest;
            due
        };
        for (_, tx) in due {
            // A dropped sleeper (cancelled task) is fine to ignore
            let _ = tx.send(());
        }
    }

    /// Current simulated time without suspending.
    pub fn current_ms(&self) -> u64 {
        self.inner.lock().now_ms
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new_at_epoch()
    }
}

#[async_trait]
impl Clock for SimulatedClock {
    async fn now_ms(&self) -> u64 {
        self.inner.lock().now_ms
    }

    async fn sleep_ms(&self, ms: u64) {
        if ms == 0 {
            return;
        }
        let rx = {
            let mut inner = self.inner.lock();
            let deadline = inner.now_ms + ms;
            let (tx, rx) = oneshot::channel();
            inner.sleepers.push((deadline, tx));
            rx
        };
        // Sender dropped only if the clock itself is torn down
        let _ = rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_clock_reports_advanced_time() {
        let clock = SimulatedClock::new(1_000);
        assert_eq!(clock.now_ms().await, 1_000);
        clock.advance(500);
        assert_eq!(clock.now_ms().await, 1_500);
    }

    #[tokio::test]
    async fn advance_wakes_due_sleepers_only() {
        let clock = SimulatedClock::new_at_epoch();

        let short = tokio::spawn({
            let clock = clock.clone();
            async move { clock.sleep_ms(100).await }
        });
        let long = tokio::spawn({
            let clock = clock.clone();
            async move { clock.sleep_ms(1_000).await }
        });

        // Let both tasks register their deadlines
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        clock.advance(100);
        short.await.expect("short sleeper completes");
        assert!(!long.is_finished());

        clock.advance(900);
        long.await.expect("long sleeper completes");
    }

    #[tokio::test]
    async fn zero_sleep_returns_immediately() {
        let clock = SimulatedClock::new_at_epoch();
        clock.sleep_ms(0).await;
    }
}
