//! Tower middleware that rejects requests a limiter has no room for.
//!
//! The layer only uses the non-blocking [`Admission`] check, so requests are never queued:
//! a rejected request resolves to [`AdmissionError::Rejected`] without reaching the inner
//! service. HTTP front-ends typically map that to `429 Too Many Requests`.

use crate::limiter::Admission;
use crate::AdmissionError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A layer that gates every request on [`Admission::try_acquire`].
#[derive(Debug)]
pub struct AdmissionLayer<L> {
    limiter: Arc<L>,
}

impl<L> AdmissionLayer<L> {
    /// Create a layer that owns `limiter`.
    pub fn new(limiter: L) -> Self {
        Self { limiter: Arc::new(limiter) }
    }

    /// Create a layer around a limiter that is also used elsewhere.
    pub fn from_shared(limiter: Arc<L>) -> Self {
        Self { limiter }
    }

    /// The limiter backing this layer.
    pub fn limiter(&self) -> &Arc<L> {
        &self.limiter
    }
}

impl<L> Clone for AdmissionLayer<L> {
    fn clone(&self) -> Self {
        Self { limiter: self.limiter.clone() }
    }
}

impl<S, L> Layer<S> for AdmissionLayer<L> {
    type Service = AdmissionService<S, L>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService { inner, limiter: self.limiter.clone() }
    }
}

/// Middleware service produced by [`AdmissionLayer`].
#[derive(Debug)]
pub struct AdmissionService<S, L> {
    inner: S,
    limiter: Arc<L>,
}

impl<S: Clone, L> Clone for AdmissionService<S, L> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), limiter: self.limiter.clone() }
    }
}

impl<S, L, Req> Service<Req> for AdmissionService<S, L>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    L: Admission,
{
    type Response = S::Response;
    type Error = AdmissionError<S::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(AdmissionError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        if !self.limiter.try_acquire() {
            tracing::debug!("request rejected by rate limiter");
            return Box::pin(std::future::ready(Err::<S::Response, _>(AdmissionError::Rejected)));
        }
        let fut = self.inner.call(req);
        Box::pin(async move { fut.await.map_err(AdmissionError::Inner) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tower::{service_fn, ServiceExt};

    #[derive(Debug)]
    struct Switch(AtomicBool);

    impl Admission for Switch {
        fn try_acquire(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn forwards_admitted_requests() {
        let layer = AdmissionLayer::new(Switch(AtomicBool::new(true)));
        let svc = layer.layer(service_fn(|req: u32| async move { Ok::<_, Infallible>(req * 2) }));

        assert_eq!(svc.oneshot(21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn rejects_without_calling_inner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let layer = AdmissionLayer::new(Switch(AtomicBool::new(false)));
        let svc = {
            let calls = calls.clone();
            layer.layer(service_fn(move |_req: ()| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, Infallible>(()) }
            }))
        };

        let err = svc.oneshot(()).await.unwrap_err();
        assert!(err.is_rejected());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wraps_inner_errors() {
        let layer = AdmissionLayer::new(Switch(AtomicBool::new(true)));
        let svc = layer.layer(service_fn(|_req: ()| async {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "inner failed"))
        }));

        let err = svc.oneshot(()).await.unwrap_err();
        assert!(!err.is_rejected());
        assert_eq!(err.into_inner().unwrap().to_string(), "inner failed");
    }

    #[tokio::test]
    async fn shared_limiter_sees_toggles() {
        let switch = Arc::new(Switch(AtomicBool::new(true)));
        let layer = AdmissionLayer::from_shared(switch.clone());
        let svc = layer.layer(service_fn(|_req: ()| async { Ok::<_, Infallible>(()) }));

        assert!(svc.clone().oneshot(()).await.is_ok());
        switch.0.store(false, Ordering::SeqCst);
        assert!(svc.oneshot(()).await.unwrap_err().is_rejected());
        assert!(Arc::ptr_eq(layer.limiter(), &switch));
    }
}
