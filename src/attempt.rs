//! Attempt-loop state machine shared by every execution mode.
//!
//! `Attempts` owns the 1-based attempt counter for a single retry run and decides what happens
//! after each failure: retry after a computed delay, or stop with a terminal [`RetryError`]. The
//! executors only invoke the operation and wait; the classification, cleanup, budget and backoff
//! rules all live here.
//!
//! States: `Running -> Succeeded`, `Running -> FailedFatal`, `Running -> Exhausted`, and
//! `Running -> FailedRetryable -> Running` while attempts remain.

use crate::error::RetryError;
use crate::retry::RetryPolicy;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Where a retry run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// An attempt is about to run or is in flight.
    Running,
    /// The operation returned a value.
    Succeeded,
    /// A retryable failure was absorbed; the caller is waiting out the backoff.
    FailedRetryable,
    /// A non-retryable failure or a failed cleanup ended the run.
    FailedFatal,
    /// The last permitted attempt failed.
    Exhausted,
}

impl State {
    /// Whether no further attempts will be made.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Succeeded | State::FailedFatal | State::Exhausted)
    }
}

/// What the executor should do after a failed attempt.
#[derive(Debug)]
pub enum Step<E> {
    /// Wait for `delay`, then run the next attempt.
    Retry { delay: Duration },
    /// Propagate the terminal outcome.
    Stop(RetryError<E>),
}

/// Attempt bookkeeping for one retry run.
pub struct Attempts<'p, E> {
    policy: &'p RetryPolicy<E>,
    operation: &'p str,
    args: Option<String>,
    attempt: u32,
    state: State,
}

impl<E> fmt::Debug for Attempts<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempts")
            .field("operation", &self.operation)
            .field("attempt", &self.attempt)
            .field("max_attempts", &self.policy.max_attempts())
            .field("state", &self.state)
            .finish()
    }
}

impl<'p, E> Attempts<'p, E>
where
    E: fmt::Display,
{
    /// Start a run of `policy` for the named operation, at attempt 1.
    pub fn new(policy: &'p RetryPolicy<E>, operation: &'p str) -> Self {
        Self { policy, operation, args: None, attempt: 1, state: State::Running }
    }

    /// Include the rendered call arguments in the per-attempt trace.
    pub fn with_args(mut self, args: &dyn fmt::Debug) -> Self {
        self.args = Some(format!("{:?}", args));
        self
    }

    /// Current attempt number (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Mark the start of the current attempt and log it.
    pub fn begin(&mut self) -> u32 {
        self.state = State::Running;
        let attempt = self.attempt;
        let max_attempts = self.policy.max_attempts();
        let args = self.args.as_deref();
        if attempt == 1 {
            debug!(operation = self.operation, attempt, max_attempts, args, "calling operation");
        } else {
            info!(operation = self.operation, attempt, max_attempts, args, "retrying operation");
        }
        attempt
    }

    /// Record a successful attempt.
    pub fn succeed(&mut self) {
        self.state = State::Succeeded;
    }

    /// Classify a failure of the current attempt and decide the next step.
    pub fn fail(&mut self, err: E) -> Step<E> {
        let attempt = self.attempt;

        if !self.policy.is_retryable(&err) {
            debug!(operation = self.operation, attempt, error = %err, "failure is not retryable");
            self.state = State::FailedFatal;
            return Step::Stop(RetryError::Fatal(err));
        }
        debug!(operation = self.operation, attempt, error = %err, "caught retryable failure");

        if let Err(cleanup_err) = self.policy.run_cleanup() {
            debug!(operation = self.operation, attempt, error = %cleanup_err, "cleanup failed");
            self.state = State::FailedFatal;
            return Step::Stop(RetryError::Cleanup(cleanup_err));
        }

        if attempt >= self.policy.max_attempts() {
            info!(operation = self.operation, attempts = attempt, "giving up");
            self.state = State::Exhausted;
            return Step::Stop(RetryError::Exhausted { attempts: attempt, last: err });
        }

        // backoff parameters were checked when the policy was built
        let delay = self.policy.backoff().delay_unchecked(attempt);
        debug!(
            operation = self.operation,
            attempt,
            delay_secs = delay.as_secs(),
            "sleeping before next attempt"
        );
        self.attempt += 1;
        self.state = State::FailedRetryable;
        Step::Retry { delay }
    }
}
