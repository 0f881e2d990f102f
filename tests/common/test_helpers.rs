#![allow(dead_code)]

use rebound::{Backoff, InstantSleeper, RetryPolicy, TrackingSleeper};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestError {
    #[error("transient failure #{0}")]
    Transient(usize),
    #[error("specific failure")]
    Specific,
}

impl TestError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TestError::Transient(_))
    }
}

/// Operation that fails with `Transient` a fixed number of times, then succeeds.
#[derive(Debug, Clone)]
pub struct Flaky {
    calls: Arc<AtomicUsize>,
    failures: usize,
}

impl Flaky {
    pub fn new(failures: usize) -> Self {
        Self { calls: Arc::new(AtomicUsize::new(0)), failures }
    }

    pub fn call(&self) -> Result<&'static str, TestError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            Err(TestError::Transient(n))
        } else {
            Ok("ok")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// `attempts=N, base_sleep=0, jitter=0`, recording every requested sleep.
pub fn instant_policy(attempts: u32, sleeper: &TrackingSleeper) -> RetryPolicy<TestError> {
    RetryPolicy::builder()
        .attempts(attempts)
        .backoff(Backoff::exponential(Duration::ZERO, Duration::from_secs(300), 1.5))
        .with_sleeper(sleeper.clone())
        .with_blocking_sleeper(sleeper.clone())
        .build()
        .expect("valid policy")
}

pub fn silent_policy(attempts: u32) -> RetryPolicy<TestError> {
    RetryPolicy::builder()
        .attempts(attempts)
        .backoff(Backoff::exponential(Duration::ZERO, Duration::ZERO, 1.0))
        .with_sleeper(InstantSleeper)
        .with_blocking_sleeper(InstantSleeper)
        .build()
        .expect("valid policy")
}
