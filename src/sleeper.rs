//! Abstraction for sleeping/waiting
//!
//! The retry loop never sleeps directly. It asks a wait capability to pause, so blocking and
//! async execution share one algorithm and tests can substitute a no-op or recording waiter
//! without touching process-wide state.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Suspend the current task without blocking the worker thread.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Block the calling thread.
pub trait BlockingSleeper: Send + Sync + std::fmt::Debug {
    fn sleep_blocking(&self, duration: Duration);
}

/// Production sleeper using tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Production sleeper parking the current OS thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl BlockingSleeper for ThreadSleeper {
    fn sleep_blocking(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Test sleeper that doesn't actually sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async {})
    }
}

impl BlockingSleeper for InstantSleeper {
    fn sleep_blocking(&self, _duration: Duration) {}
}

/// Test sleeper that records every requested duration and returns immediately.
///
/// Clones share the same record, so one instance can be handed to a policy as both its async
/// and blocking sleeper.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded durations, oldest first.
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, duration: Duration) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.record(duration);
        Box::pin(async {})
    }
}

impl BlockingSleeper for TrackingSleeper {
    fn sleep_blocking(&self, duration: Duration) {
        self.record(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn instant_sleeper_doesnt_sleep() {
        let sleeper = InstantSleeper;
        let start = std::time::Instant::now();
        sleeper.sleep(Duration::from_secs(10)).await;
        sleeper.sleep_blocking(Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn tracking_sleeper_records_calls_from_both_modes() {
        let sleeper = TrackingSleeper::new();

        sleeper.sleep(Duration::from_secs(1)).await;
        sleeper.sleep_blocking(Duration::from_secs(2));
        sleeper.clone().sleep(Duration::from_secs(4)).await;

        assert_eq!(
            sleeper.calls(),
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert_eq!(sleeper.call_count(), 3);
    }

    #[tokio::test]
    async fn tracking_sleeper_can_clear() {
        let sleeper = TrackingSleeper::new();
        sleeper.sleep_blocking(Duration::from_millis(100));
        assert_eq!(sleeper.call_count(), 1);

        sleeper.clear();
        assert_eq!(sleeper.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits_on_runtime_clock() {
        let sleeper = TokioSleeper;
        let start = tokio::time::Instant::now();
        sleeper.sleep(Duration::from_secs(60)).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[test]
    fn thread_sleeper_blocks() {
        let start = std::time::Instant::now();
        ThreadSleeper.sleep_blocking(Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
