//! Error types for retry policies
use std::fmt;
use thiserror::Error;

/// Precondition violations reported by the backoff calculator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackoffError {
    /// Jitter could drive the unscaled delay negative.
    #[error("jitter ({jitter}s) must not exceed base sleep ({base_sleep}s)")]
    JitterExceedsBase { jitter: u64, base_sleep: u64 },
}

/// Errors produced while building a retry policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// `attempts` must be > 0.
    #[error("attempts must be > 0 (got {0})")]
    InvalidAttempts(u32),
    /// `scale` must be a finite, positive factor.
    #[error("scale must be finite and positive (got {0})")]
    InvalidScale(f64),
    #[error(transparent)]
    Backoff(#[from] BackoffError),
}

/// Terminal outcome of a retry run that did not succeed.
///
/// Every variant except `InvalidConfiguration` carries the original failure value untouched, so
/// callers can always recover the cause with [`RetryError::into_inner`].
#[derive(Debug, Clone)]
pub enum RetryError<E> {
    /// The operation failed with an error the policy does not retry. No attempts were spent
    /// beyond the one that produced it.
    Fatal(E),
    /// Every permitted attempt failed with a retryable error; `last` is the final one.
    Exhausted { attempts: u32, last: E },
    /// The cleanup hook failed after a retryable failure and aborted the loop.
    Cleanup(E),
    /// The backoff parameters were rejected before sleeping.
    InvalidConfiguration(BackoffError),
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(e) => write!(f, "{}", e),
            Self::Exhausted { attempts, last } => {
                write!(f, "retry exhausted after {} attempts; last error: {}", attempts, last)
            }
            Self::Cleanup(e) => write!(f, "cleanup failed: {}", e),
            Self::InvalidConfiguration(e) => write!(f, "invalid retry configuration: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fatal(e) | Self::Cleanup(e) | Self::Exhausted { last: e, .. } => Some(e),
            Self::InvalidConfiguration(e) => Some(e),
        }
    }
}

impl<E> From<BackoffError> for RetryError<E> {
    fn from(err: BackoffError) -> Self {
        RetryError::InvalidConfiguration(err)
    }
}

impl<E> RetryError<E> {
    /// Check if the failure was not retryable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
    /// Check if the attempt budget ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
    /// Check if the cleanup hook aborted the loop.
    pub fn is_cleanup(&self) -> bool {
        matches!(self, Self::Cleanup(_))
    }
    /// Check if the backoff parameters were rejected.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
    /// Number of attempts made before giving up, if the budget was exhausted.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
    /// Borrow the original failure (from the operation or the cleanup hook).
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Self::Fatal(e) | Self::Cleanup(e) | Self::Exhausted { last: e, .. } => Some(e),
            Self::InvalidConfiguration(_) => None,
        }
    }
    /// Take the original failure (from the operation or the cleanup hook).
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Fatal(e) | Self::Cleanup(e) | Self::Exhausted { last: e, .. } => Some(e),
            Self::InvalidConfiguration(_) => None,
        }
    }
}
