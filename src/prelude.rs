//! Convenient re-exports for common Rebound types.
pub use crate::{
    backoff::{
        compute_sleep, Backoff, DEFAULT_BASE_SLEEP, DEFAULT_JITTER, DEFAULT_MAX_SLEEP,
        DEFAULT_SCALE,
    },
    config::RetrySettings,
    error::{BackoffError, BuildError, RetryError},
    layer::RetryLayer,
    retrier::Retrier,
    retry::{RetryPolicy, RetryPolicyBuilder, DEFAULT_ATTEMPTS},
    sleeper::{BlockingSleeper, Sleeper, ThreadSleeper, TokioSleeper},
    wrap::Retriable,
};
