#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Rebound
//!
//! Retry fallible operations with exponential backoff and randomized jitter, in blocking or async
//! code.
//!
//! ## Features
//!
//! - **One attempt loop** shared by the blocking (`retry`) and async (`execute`) executors
//! - **Exponential backoff** in whole seconds with a cap and attempt-scaled jitter
//! - **Retry classification** via a predicate; everything else fails fast
//! - **Cleanup hook** run after every retryable failure
//! - **Decorator and scoped wrappers**, a tower `Layer`, and an attempt iterator
//! - **Injectable sleepers** so tests never wait on real time
//!
//! ## Quick Start
//!
//! ```rust
//! use rebound::{Backoff, RetryPolicy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let policy = RetryPolicy::<std::io::Error>::builder()
//!         .attempts(3)
//!         .backoff(Backoff::exponential(Duration::from_secs(1), Duration::from_secs(30), 2.0))
//!         .build()
//!         .unwrap();
//!
//!     let result = policy
//!         .execute(|| async {
//!             // Your async operation here
//!             Ok::<_, std::io::Error>(())
//!         })
//!         .await;
//!     assert!(result.is_ok());
//! }
//! ```

pub mod attempt;
pub mod backoff;
pub mod config;
pub mod error;
pub mod layer;
pub mod prelude;
pub mod retrier;
pub mod retry;
pub mod sleeper;
pub mod wrap;

// Re-exports
pub use attempt::{Attempts, State, Step};
pub use backoff::{compute_sleep, compute_sleep_with_rng, Backoff};
pub use config::RetrySettings;
pub use error::{BackoffError, BuildError, RetryError};
pub use layer::{RetryLayer, RetryService};
pub use retrier::Retrier;
pub use retry::{RetryPolicy, RetryPolicyBuilder};
pub use sleeper::{
    BlockingSleeper, InstantSleeper, Sleeper, ThreadSleeper, TokioSleeper, TrackingSleeper,
};
pub use wrap::Retriable;
