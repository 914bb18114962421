//! Default transport using hyper-util.

use std::task::{Context, Poll};

use bytes::Bytes;
use courier_core::{Error, ResponseBody, Result, Transport, TransportFuture};
use futures_util::TryStreamExt;
use http_body_util::{BodyStream, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tower_service::Service;

use crate::config::TransportConfig;
use crate::connector::https_connector;

/// Transport backed by a pooled hyper-util client with rustls.
///
/// The response body is streamed, it is drained by the request.
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }

    fn execute(&self, request: http::Request<Bytes>) -> TransportFuture<'static> {
        let pending = self.inner.request(request.map(Full::new));
        let timeout = self.config.timeout;

        Box::pin(async move {
            let response = tokio::time::timeout(timeout, pending)
                .await
                .map_err(|_| Error::Timeout)?
                .map_err(Self::map_hyper_error)?;

            Ok(response.map(|body| {
                ResponseBody::from_stream(
                    BodyStream::new(body)
                        .map_ok(|frame| frame.into_data().unwrap_or_default())
                        .map_err(|err| Error::connection(err.to_string())),
                )
            }))
        })
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_> {
        self.execute(request)
    }
}

impl Service<http::Request<Bytes>> for HyperTransport {
    type Response = http::Response<ResponseBody>;
    type Error = Error;
    type Future = TransportFuture<'static>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<Bytes>) -> Self::Future {
        self.execute(request)
    }
}
