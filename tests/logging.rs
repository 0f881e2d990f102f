mod common;

use common::test_helpers::{silent_policy, Flaky, TestError};
use rebound::{Backoff, InstantSleeper, RetryPolicy};
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

type Captured = Arc<Mutex<Vec<(Level, String)>>>;

/// Layer recording every event as its level plus `name=value` pairs.
struct Capture(Captured);

struct Fields(String);

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields(String::new());
        event.record(&mut fields);
        self.0.lock().unwrap().push((*event.metadata().level(), fields.0));
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<(Level, String)>) {
    let events: Captured = Arc::default();
    let subscriber = tracing_subscriber::registry().with(Capture(events.clone()));
    let out = tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().unwrap().clone();
    (out, events)
}

fn find<'a>(events: &'a [(Level, String)], needle: &str) -> Vec<&'a (Level, String)> {
    events.iter().filter(|(_, msg)| msg.contains(needle)).collect()
}

#[test]
fn first_attempt_is_debug_and_retries_are_info() {
    let flaky = Flaky::new(2);
    let (result, events) = capture(|| silent_policy(5).retry(|| flaky.call()));
    assert!(result.is_ok());

    let first = find(&events, "calling operation");
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].0, Level::DEBUG);

    let retries = find(&events, "retrying operation");
    assert_eq!(retries.len(), 2);
    assert!(retries.iter().all(|(level, _)| *level == Level::INFO));
    assert!(retries[0].1.contains("attempt=2"));
    assert!(retries[1].1.contains("attempt=3"));

    assert!(find(&events, "giving up").is_empty());
}

#[test]
fn give_up_notice_names_the_operation() {
    let policy = RetryPolicy::builder()
        .attempts(2)
        .backoff(Backoff::exponential(Duration::ZERO, Duration::ZERO, 1.0))
        .name("fetch-index")
        .with_blocking_sleeper(InstantSleeper)
        .build()
        .unwrap();

    let (result, events) =
        capture(|| policy.retry(|| Err::<(), _>(TestError::Transient(0))));
    assert!(result.unwrap_err().is_exhausted());

    let give_up = find(&events, "giving up");
    assert_eq!(give_up.len(), 1);
    assert_eq!(give_up[0].0, Level::INFO);
    assert!(give_up[0].1.contains("fetch-index"));
}

#[test]
fn decorated_calls_can_log_their_arguments() {
    let policy = RetryPolicy::builder()
        .attempts(1)
        .backoff(Backoff::exponential(Duration::ZERO, Duration::ZERO, 1.0))
        .log_args(true)
        .with_blocking_sleeper(InstantSleeper)
        .build()
        .unwrap();
    let lookup = policy
        .retriable(|(user, id): (&str, u32)| Ok::<_, TestError>(format!("{}:{}", user, id)));

    let (result, events) = capture(|| lookup.call_logged(("alice", 7)));
    assert_eq!(result.unwrap(), "alice:7");
    assert!(find(&events, "calling operation")[0].1.contains("(\\\"alice\\\", 7)"));
}
