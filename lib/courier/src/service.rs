//! Tower services as transports.

use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use courier_core::{Error, ResponseBody, Transport, TransportFuture};
use tower::ServiceExt;
use tower_service::Service;

/// [`Transport`] wrapping any tower [`Service`].
///
/// Tower services take `&mut self`, so the service is kept behind a mutex
/// and cloned for each call. The lock is released before the call runs.
///
/// # Example
///
/// ```ignore
/// use courier::{Client, HyperTransport, ServiceTransport};
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .concurrency_limit(16)
///     .service(HyperTransport::new());
/// let client = Client::with_transport(ServiceTransport::new(service));
/// ```
pub struct ServiceTransport<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> ServiceTransport<S> {
    /// Wrap a service.
    pub fn new(service: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }
}

impl<S> Clone for ServiceTransport<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for ServiceTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTransport").finish_non_exhaustive()
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>>
        + Clone
        + Send
        + 'static,
    S::Error: Into<Error>,
    S::Future: Send,
{
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_> {
        let service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.oneshot(request).await.map_err(Into::into) })
    }
}
