//! Decorator and scoped conveniences on top of [`RetryPolicy`].
//!
//! [`RetryPolicy::retriable`] wraps an operation taking one argument value so that every call
//! runs through the policy; the argument is cloned into each attempt. Several arguments travel
//! as a tuple, none as `()`. [`RetryPolicy::retrying`] hands the same wrapper to a closure for
//! the duration of a scope.
//!
//! ```rust
//! use rebound::{Backoff, InstantSleeper, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::<String>::builder()
//!     .backoff(Backoff::exponential(Duration::ZERO, Duration::ZERO, 1.0))
//!     .with_blocking_sleeper(InstantSleeper)
//!     .build()
//!     .unwrap();
//!
//! let add = policy.retriable(|(a, b): (i32, i32)| Ok::<_, String>(a + b));
//! assert_eq!(add.call((2, 3)).unwrap(), 5);
//!
//! let total = policy.retrying(|n: u32| Ok::<_, String>(n * 2), |double| {
//!     double.call(4).unwrap() + double.call(5).unwrap()
//! });
//! assert_eq!(total, 18);
//! ```

use crate::attempt::Attempts;
use crate::error::RetryError;
use crate::retry::RetryPolicy;
use std::fmt;
use std::future::Future;

/// An operation bound to a fixed retry policy.
#[derive(Clone)]
pub struct Retriable<F, E> {
    policy: RetryPolicy<E>,
    operation: F,
}

impl<F, E> fmt::Debug for Retriable<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriable")
            .field("policy", &self.policy)
            .field("operation", &std::any::type_name::<F>())
            .finish()
    }
}

impl<F, E> Retriable<F, E>
where
    E: fmt::Display + 'static,
{
    pub fn new(policy: RetryPolicy<E>, operation: F) -> Self {
        Self { policy, operation }
    }

    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    /// Unwrap the bare operation.
    pub fn into_inner(self) -> F {
        self.operation
    }

    /// Call a blocking operation through the policy.
    pub fn call<A, T>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Fn(A) -> Result<T, E>,
        A: Clone,
    {
        self.policy.drive_blocking(self.attempts(), || (self.operation)(args.clone()))
    }

    /// Like [`Retriable::call`], also tracing `args` on every attempt when the policy has
    /// `log_args` enabled.
    pub fn call_logged<A, T>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Fn(A) -> Result<T, E>,
        A: Clone + fmt::Debug,
    {
        let attempts = self.logged_attempts(&args);
        self.policy.drive_blocking(attempts, || (self.operation)(args.clone()))
    }

    /// Call an async operation through the policy.
    pub async fn call_async<A, T, Fut>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Clone,
    {
        self.policy.drive_async(self.attempts(), || (self.operation)(args.clone())).await
    }

    /// Async counterpart of [`Retriable::call_logged`].
    pub async fn call_logged_async<A, T, Fut>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Clone + fmt::Debug,
    {
        let attempts = self.logged_attempts(&args);
        self.policy.drive_async(attempts, || (self.operation)(args.clone())).await
    }

    fn attempts(&self) -> Attempts<'_, E> {
        Attempts::new(&self.policy, self.policy.operation_name::<F>())
    }

    fn logged_attempts(&self, args: &dyn fmt::Debug) -> Attempts<'_, E> {
        if self.policy.logs_args() {
            self.attempts().with_args(args)
        } else {
            self.attempts()
        }
    }
}

impl<E> RetryPolicy<E>
where
    E: fmt::Display + 'static,
{
    /// Bind `operation` to a copy of this policy.
    pub fn retriable<F>(&self, operation: F) -> Retriable<F, E> {
        Retriable::new(self.clone(), operation)
    }

    /// Run `scope` with a retry-enabled `operation`; returns whatever `scope` returns.
    pub fn retrying<F, R>(&self, operation: F, scope: impl FnOnce(&Retriable<F, E>) -> R) -> R {
        let retriable = self.retriable(operation);
        scope(&retriable)
    }
}
