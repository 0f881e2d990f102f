//! Iterator form of the retry loop.
//!
//! `Retrier` yields attempt numbers `1..=attempts` and blocks for the backoff delay before every
//! attempt after the first. The caller runs its own logic in the loop body and `break`s once it
//! succeeds, so no sleep ever follows a successful attempt.
//!
//! ```rust
//! use rebound::{Backoff, InstantSleeper, Retrier};
//! use std::time::Duration;
//!
//! let backoff = Backoff::exponential(Duration::from_secs(1), Duration::from_secs(10), 2.0);
//! let mut connected = None;
//! for attempt in Retrier::new(5, backoff, InstantSleeper).unwrap() {
//!     if attempt == 3 {
//!         connected = Some(attempt);
//!         break;
//!     }
//! }
//! assert_eq!(connected, Some(3));
//! ```

use crate::backoff::Backoff;
use crate::error::BuildError;
use crate::retry::{validate_parameters, RetryPolicy};
use crate::sleeper::{BlockingSleeper, ThreadSleeper};
use std::sync::Arc;
use tracing::{debug, info};

/// Iterator over attempt numbers with backoff sleeps in between.
#[derive(Debug, Clone)]
pub struct Retrier {
    max_attempts: u32,
    backoff: Backoff,
    sleeper: Arc<dyn BlockingSleeper>,
    attempt: u32,
}

impl Retrier {
    /// Build a retrier, validating the attempt budget and backoff parameters.
    pub fn new<S>(attempts: u32, backoff: Backoff, sleeper: S) -> Result<Self, BuildError>
    where
        S: BlockingSleeper + 'static,
    {
        validate_parameters(attempts, &backoff)?;
        Ok(Self { max_attempts: attempts, backoff, sleeper: Arc::new(sleeper), attempt: 0 })
    }

    /// Retrier with the given budget and backoff that sleeps on the calling thread.
    pub fn with_backoff(attempts: u32, backoff: Backoff) -> Result<Self, BuildError> {
        Self::new(attempts, backoff, ThreadSleeper)
    }

    /// Attempts handed out so far.
    pub fn attempts_made(&self) -> u32 {
        self.attempt
    }
}

impl Iterator for Retrier {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.attempt >= self.max_attempts {
            if self.attempt > 0 {
                info!(attempts = self.attempt, "retrier exhausted, giving up");
            }
            return None;
        }

        if self.attempt > 0 {
            let delay = self.backoff.delay_unchecked(self.attempt);
            debug!(
                attempt = self.attempt + 1,
                max_attempts = self.max_attempts,
                delay_secs = delay.as_secs(),
                "sleeping before next attempt"
            );
            self.sleeper.sleep_blocking(delay);
        }

        self.attempt += 1;
        Some(self.attempt)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.max_attempts - self.attempt) as usize;
        (remaining, Some(remaining))
    }
}

impl<E> RetryPolicy<E> {
    /// Iterator over this policy's attempts, sleeping with its blocking sleeper between them.
    pub fn retrier(&self) -> Retrier {
        Retrier {
            max_attempts: self.max_attempts(),
            backoff: *self.backoff(),
            sleeper: self.blocking_sleeper(),
            attempt: 0,
        }
    }
}
