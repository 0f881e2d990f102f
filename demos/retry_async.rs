//! Async retry, driven through a tower service stack.
use rebound::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::{service_fn, ServiceBuilder, ServiceExt};

#[derive(Debug, thiserror::Error)]
#[error("upstream returned {0}")]
struct Upstream(u16);

#[tokio::main]
async fn main() -> Result<(), RetryError<Upstream>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let settings = RetrySettings {
        attempts: 3,
        base_sleep_secs: 1,
        max_sleep_secs: 2,
        jitter_secs: 0,
        ..Default::default()
    };
    let policy = RetryPolicyBuilder::from_settings(&settings)
        .should_retry(|e: &Upstream| e.0 >= 500)
        .build()
        .expect("valid retry policy");

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let upstream = service_fn(move |path: &'static str| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(Upstream(503))
            } else {
                Ok(format!("GET {} -> 200", path))
            }
        }
    });
    let svc = ServiceBuilder::new().layer(policy.into_layer()).service(upstream);

    let response = svc.oneshot("/status").await?;
    println!("{} after {} calls", response, calls.load(Ordering::SeqCst));
    Ok(())
}
