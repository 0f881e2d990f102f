//! Plain-data retry settings.
//!
//! `RetrySettings` holds the numeric knobs of a policy in whole seconds so they can live in a
//! config file. With the `serde` feature enabled it (de)serializes, and missing fields fall back to
//! the defaults.
//!
//! ```rust
//! use rebound::{RetryPolicyBuilder, RetrySettings};
//!
//! let settings = RetrySettings { attempts: 3, base_sleep_secs: 5, ..RetrySettings::default() };
//! let policy = RetryPolicyBuilder::<std::io::Error>::from_settings(&settings).build().unwrap();
//! assert_eq!(policy.max_attempts(), 3);
//! ```

use crate::backoff::{Backoff, DEFAULT_BASE_SLEEP, DEFAULT_JITTER, DEFAULT_MAX_SLEEP, DEFAULT_SCALE};
use crate::retry::DEFAULT_ATTEMPTS;
use std::time::Duration;

/// Attempt budget and backoff parameters, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetrySettings {
    /// Maximum invocations, including the first.
    pub attempts: u32,
    /// Unscaled delay between attempts.
    pub base_sleep_secs: u64,
    /// Upper clamp on computed delays.
    pub max_sleep_secs: u64,
    /// Growth factor per elapsed attempt.
    pub scale: f64,
    /// Jitter bound; `0` disables jitter.
    pub jitter_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_sleep_secs: DEFAULT_BASE_SLEEP.as_secs(),
            max_sleep_secs: DEFAULT_MAX_SLEEP.as_secs(),
            scale: DEFAULT_SCALE,
            jitter_secs: DEFAULT_JITTER.as_secs(),
        }
    }
}

impl RetrySettings {
    /// Backoff parameters described by these settings.
    pub fn backoff(&self) -> Backoff {
        Backoff::default()
            .base_sleep(Duration::from_secs(self.base_sleep_secs))
            .max_sleep(Duration::from_secs(self.max_sleep_secs))
            .scale(self.scale)
            .jitter(Duration::from_secs(self.jitter_secs))
    }
}

impl From<RetrySettings> for Backoff {
    fn from(settings: RetrySettings) -> Self {
        settings.backoff()
    }
}
