//! Tower-native retry layer.
//!
//! `RetryLayer` decorates any `Service` whose requests are `Clone`: each call is driven through
//! the policy's async loop, with a fresh clone of the inner service and of the request per
//! attempt.

use crate::attempt::Attempts;
use crate::error::RetryError;
use crate::retry::RetryPolicy;
use futures::future::BoxFuture;
use std::fmt;
use std::task::{Context, Poll};
use tower::ServiceExt;
use tower_layer::Layer;
use tower_service::Service;

/// Layer applying a [`RetryPolicy`] to an inner service.
pub struct RetryLayer<E> {
    policy: RetryPolicy<E>,
}

impl<E> RetryLayer<E> {
    pub fn new(policy: RetryPolicy<E>) -> Self {
        Self { policy }
    }
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self { policy: self.policy.clone() }
    }
}

impl<E> fmt::Debug for RetryLayer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryLayer").field("policy", &self.policy).finish()
    }
}

impl<E> RetryPolicy<E> {
    /// Turn this policy into a tower layer.
    pub fn into_layer(self) -> RetryLayer<E> {
        RetryLayer::new(self)
    }
}

/// Retry service produced by `RetryLayer`.
pub struct RetryService<S, E> {
    inner: S,
    policy: RetryPolicy<E>,
}

impl<S: Clone, E> Clone for RetryService<S, E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), policy: self.policy.clone() }
    }
}

impl<S: fmt::Debug, E> fmt::Debug for RetryService<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryService")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<S, E, Request> Service<Request> for RetryService<S, E>
where
    Request: Clone + Send + 'static,
    S: Service<Request> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<E>,
    S::Future: Send + 'static,
    E: fmt::Display + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = RetryError<E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Every attempt drives its own clone of `inner` to readiness.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let policy = self.policy.clone();
        let inner = self.inner.clone();
        let operation = move || {
            let svc = inner.clone();
            let req = req.clone();
            async move { svc.oneshot(req).await.map_err(Into::into) }
        };
        Box::pin(async move {
            let attempts = Attempts::new(&policy, policy.operation_name::<S>());
            policy.drive_async(attempts, operation).await
        })
    }
}

impl<S, E> Layer<S> for RetryLayer<E> {
    type Service = RetryService<S, E>;

    fn layer(&self, service: S) -> Self::Service {
        RetryService { inner: service, policy: self.policy.clone() }
    }
}
