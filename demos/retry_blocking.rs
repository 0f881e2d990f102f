//! Blocking retry with a cleanup hook and a retryable-error filter.
use rebound::prelude::*;
use std::io;
use std::time::Duration;

fn main() -> Result<(), RetryError<io::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let policy = RetryPolicy::builder()
        .attempts(4)
        .backoff(Backoff::exponential(Duration::from_secs(1), Duration::from_secs(4), 2.0))
        .should_retry(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut)
        .cleanup(|| {
            println!("dropping half-written output");
            Ok(())
        })
        .name("download")
        .build()
        .expect("valid retry policy");

    let mut calls = 0;
    let body = policy.retry(|| {
        calls += 1;
        if calls < 3 {
            Err(io::Error::new(io::ErrorKind::TimedOut, "server too slow"))
        } else {
            Ok("payload")
        }
    })?;

    println!("{} after {} calls", body, calls);
    Ok(())
}
