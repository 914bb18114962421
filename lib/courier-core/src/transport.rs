//! Transport abstraction.
//!
//! A [`Transport`] sends a prepared request and resolves to a response whose
//! body is a [`ResponseBody`]. It owns everything below that line: pooling,
//! TLS, HTTP versions, redirects.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::arena::Arena;
use crate::Result;

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<http::Response<ResponseBody>>> + Send + 'a>>;

/// Boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Sends prepared requests.
pub trait Transport: Send + Sync + 'static {
    /// Send the request.
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_>;
}

/// [`Transport`] backed by an async closure, see [`transport_fn`].
#[derive(Clone)]
pub struct TransportFn<F>(F);

/// Build a [`Transport`] from an async closure.
///
/// ```
/// use bytes::Bytes;
/// use courier_core::{Error, ResponseBody, transport_fn};
///
/// let transport = transport_fn(|_request: http::Request<Bytes>| async {
///     Ok::<_, Error>(http::Response::new(ResponseBody::from("pong")))
/// });
/// # let _ = transport;
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<http::Response<ResponseBody>>> + Send + 'static,
{
    TransportFn(f)
}

impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<http::Response<ResponseBody>>> + Send + 'static,
{
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_> {
        Box::pin((self.0)(request))
    }
}

impl<F> fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransportFn")
    }
}

// ============================================================================
// Response Body
// ============================================================================

/// Body of a transport response.
pub enum ResponseBody {
    /// Body already in memory.
    Full(Bytes),
    /// Body arriving as chunks.
    Stream(BodyStream),
}

impl ResponseBody {
    /// An empty body.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Full(Bytes::new())
    }

    /// Wrap a stream of chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    /// Drain the body, staging chunks in an arena buffer.
    pub async fn collect(self, arena: &Arena) -> Result<Bytes> {
        match self {
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(mut stream) => {
                let mut buf = arena.acquire();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.to_bytes())
            }
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(Bytes::from(bytes))
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        Self::Full(Bytes::from(text))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(text: &'static str) -> Self {
        Self::Full(Bytes::from_static(text.as_bytes()))
    }
}
