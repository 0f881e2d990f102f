//! Retry policy implementation
//!
//! Retry policy for fallible operations, in blocking and async form.
//!
//! Semantics:
//! - `attempts` counts total invocations (initial try + retries).
//! - `should_retry` decides whether a failure is retryable; anything else is returned at once as
//!   [`RetryError::Fatal`] without cleanup or sleeping.
//! - `cleanup` runs after every retryable failure, before the budget check and before sleeping.
//!   If it fails, its error ends the run as [`RetryError::Cleanup`].
//! - After a retryable failure on attempt `n` (not the last), the policy sleeps for
//!   `backoff.delay(n)` and runs attempt `n + 1`.
//! - Once the last permitted attempt fails, the run ends as [`RetryError::Exhausted`] carrying
//!   that final failure. No sleep follows the last attempt.
//!
//! Both `retry` (blocking) and `execute` (async) drive the same [`Attempts`] state machine; they
//! differ only in how they wait. Dropping the future returned by `execute` cancels the run:
//! no further attempts are made.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use rebound::{Backoff, InstantSleeper, RetryPolicy};
//!
//! let policy = RetryPolicy::<std::io::Error>::builder()
//!     .attempts(3)
//!     .backoff(Backoff::exponential(Duration::from_secs(1), Duration::from_secs(10), 2.0))
//!     .with_blocking_sleeper(InstantSleeper)
//!     .build()
//!     .unwrap();
//!
//! let mut calls = 0;
//! let value = policy.retry(|| {
//!     calls += 1;
//!     if calls < 2 {
//!         Err(std::io::Error::new(std::io::ErrorKind::Other, "flaky"))
//!     } else {
//!         Ok(calls)
//!     }
//! });
//! assert_eq!(value.unwrap(), 2);
//! ```

use crate::attempt::{Attempts, Step};
use crate::backoff::Backoff;
use crate::config::RetrySettings;
use crate::error::{BuildError, RetryError};
use crate::sleeper::{BlockingSleeper, Sleeper, ThreadSleeper, TokioSleeper};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Default total attempts.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Attempt budget and backoff checks shared by every constructor.
pub(crate) fn validate_parameters(max_attempts: u32, backoff: &Backoff) -> Result<(), BuildError> {
    if max_attempts == 0 {
        return Err(BuildError::InvalidAttempts(0));
    }
    let scale = backoff.scale_factor();
    if !scale.is_finite() || scale <= 0.0 {
        return Err(BuildError::InvalidScale(scale));
    }
    backoff.validate()?;
    Ok(())
}

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Cleanup<E> = Arc<dyn Fn() -> Result<(), E> + Send + Sync>;

/// Retry policy combining attempt budget, backoff, classifier, cleanup hook and sleepers.
///
/// Immutable once built; clones share the classifier, hook and sleepers.
pub struct RetryPolicy<E> {
    max_attempts: u32,
    backoff: Backoff,
    should_retry: Predicate<E>,
    cleanup: Option<Cleanup<E>>,
    sleeper: Arc<dyn Sleeper>,
    blocking_sleeper: Arc<dyn BlockingSleeper>,
    name: Option<Arc<str>>,
    log_args: bool,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            should_retry: self.should_retry.clone(),
            cleanup: self.cleanup.clone(),
            sleeper: self.sleeper.clone(),
            blocking_sleeper: self.blocking_sleeper.clone(),
            name: self.name.clone(),
            log_args: self.log_args,
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("should_retry", &"<predicate>")
            .field("cleanup", &self.cleanup.as_ref().map(|_| "<hook>"))
            .field("sleeper", &self.sleeper)
            .field("blocking_sleeper", &self.blocking_sleeper)
            .field("name", &self.name)
            .field("log_args", &self.log_args)
            .finish()
    }
}

impl<E> RetryPolicy<E> {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Whether decorated calls log their forwarded arguments.
    pub fn logs_args(&self) -> bool {
        self.log_args
    }

    pub(crate) fn blocking_sleeper(&self) -> Arc<dyn BlockingSleeper> {
        self.blocking_sleeper.clone()
    }

    pub(crate) fn is_retryable(&self, err: &E) -> bool {
        (self.should_retry)(err)
    }

    pub(crate) fn run_cleanup(&self) -> Result<(), E> {
        match &self.cleanup {
            Some(cleanup) => cleanup(),
            None => Ok(()),
        }
    }

    /// Name used in log lines: the configured label, or the operation's type name.
    pub(crate) fn operation_name<Op>(&self) -> &str {
        self.name.as_deref().unwrap_or(std::any::type_name::<Op>())
    }
}

impl<E> RetryPolicy<E>
where
    E: fmt::Display + 'static,
{
    /// Construct a new builder with defaults.
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new()
    }

    /// Run a blocking operation with retry semantics. The calling thread sleeps between attempts.
    pub fn retry<T, Op>(&self, operation: Op) -> Result<T, RetryError<E>>
    where
        Op: FnMut() -> Result<T, E>,
    {
        self.drive_blocking(Attempts::new(self, self.operation_name::<Op>()), operation)
    }

    /// Run an async operation with retry semantics. Waiting between attempts yields to the
    /// runtime instead of blocking a thread.
    pub async fn execute<T, Fut, Op>(&self, operation: Op) -> Result<T, RetryError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
    {
        self.drive_async(Attempts::new(self, self.operation_name::<Op>()), operation).await
    }

    pub(crate) fn drive_blocking<T, Op>(
        &self,
        mut attempts: Attempts<'_, E>,
        mut operation: Op,
    ) -> Result<T, RetryError<E>>
    where
        Op: FnMut() -> Result<T, E>,
    {
        loop {
            attempts.begin();
            match operation() {
                Ok(value) => {
                    attempts.succeed();
                    return Ok(value);
                }
                Err(err) => match attempts.fail(err) {
                    Step::Retry { delay } => self.blocking_sleeper.sleep_blocking(delay),
                    Step::Stop(err) => return Err(err),
                },
            }
        }
    }

    pub(crate) async fn drive_async<T, Fut, Op>(
        &self,
        mut attempts: Attempts<'_, E>,
        mut operation: Op,
    ) -> Result<T, RetryError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
    {
        loop {
            attempts.begin();
            match operation().await {
                Ok(value) => {
                    attempts.succeed();
                    return Ok(value);
                }
                Err(err) => match attempts.fail(err) {
                    Step::Retry { delay } => self.sleeper.sleep(delay).await,
                    Step::Stop(err) => return Err(err),
                },
            }
        }
    }
}

/// Builder for `RetryPolicy`.
pub struct RetryPolicyBuilder<E> {
    max_attempts: u32,
    backoff: Backoff,
    should_retry: Predicate<E>,
    cleanup: Option<Cleanup<E>>,
    sleeper: Arc<dyn Sleeper>,
    blocking_sleeper: Arc<dyn BlockingSleeper>,
    name: Option<Arc<str>>,
    log_args: bool,
}

impl<E> RetryPolicyBuilder<E>
where
    E: fmt::Display + 'static,
{
    /// Create a builder with the documented defaults: 5 attempts, 60s base sleep, 300s cap,
    /// scale 1.5, 1s jitter, every failure retryable, no cleanup.
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            backoff: Backoff::default(),
            should_retry: Arc::new(|_| true),
            cleanup: None,
            sleeper: Arc::new(TokioSleeper),
            blocking_sleeper: Arc::new(ThreadSleeper),
            name: None,
            log_args: false,
        }
    }

    /// Start from plain-data settings (attempt budget and backoff).
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new().attempts(settings.attempts).backoff(settings.backoff())
    }

    /// Set total attempts (initial + retries). Must be > 0.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff parameters.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Predicate deciding whether a failure is retryable.
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Hook run after each retryable failure, before sleeping.
    pub fn cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
    {
        self.cleanup = Some(Arc::new(cleanup));
        self
    }

    /// Label used for the operation in log lines.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Log the forwarded arguments of decorated calls.
    pub fn log_args(mut self, enabled: bool) -> Self {
        self.log_args = enabled;
        self
    }

    /// Provide a custom async sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Provide a custom blocking sleeper implementation.
    pub fn with_blocking_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: BlockingSleeper + 'static,
    {
        self.blocking_sleeper = Arc::new(sleeper);
        self
    }

    /// Build the retry policy, validating inputs.
    pub fn build(self) -> Result<RetryPolicy<E>, BuildError> {
        validate_parameters(self.max_attempts, &self.backoff)?;
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            should_retry: self.should_retry,
            cleanup: self.cleanup,
            sleeper: self.sleeper,
            blocking_sleeper: self.blocking_sleeper,
            name: self.name,
            log_args: self.log_args,
        })
    }
}

impl<E> Default for RetryPolicyBuilder<E>
where
    E: fmt::Display + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
