//! Drained transport response.
//!
//! [`RawResponse`] is what status handlers see: the status, headers and fully
//! buffered body, with the method and URL that were sent and the codec in
//! effect for the call.

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::codec::{Codec, Destination};
use crate::{Error, Result};

/// Buffered HTTP response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    method: http::Method,
    uri: http::Uri,
    inner: http::Response<Bytes>,
    codec: Codec,
}

impl RawResponse {
    /// Creates a new response.
    #[must_use]
    pub fn new(
        method: http::Method,
        uri: http::Uri,
        inner: http::Response<Bytes>,
        codec: Codec,
    ) -> Self {
        Self {
            method,
            uri,
            inner,
            codec,
        }
    }

    /// Method of the request.
    #[must_use]
    pub const fn method(&self) -> &http::Method {
        &self.method
    }

    /// URL of the request.
    #[must_use]
    pub const fn uri(&self) -> &http::Uri {
        &self.uri
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Status is 1xx.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        self.inner.status().is_informational()
    }

    /// Status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    /// Status is 3xx.
    #[must_use]
    pub fn is_redirection(&self) -> bool {
        self.inner.status().is_redirection()
    }

    /// Status is 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.inner.status().is_client_error()
    }

    /// Status is 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.inner.status().is_server_error()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Single header value by name, if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.inner.headers().get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    /// Codec used to decode the body.
    #[must_use]
    pub const fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Underlying `http` response.
    #[must_use]
    pub const fn as_http(&self) -> &http::Response<Bytes> {
        &self.inner
    }

    /// Consume into the underlying `http` response.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        self.inner
    }

    /// Decode the body into `dst` according to the response content type.
    ///
    /// Nothing is decoded for a 204 or an empty body.
    pub fn decode_into(&self, dst: &mut dyn Destination) -> Result<()> {
        if self.status() == 204 || self.body().is_empty() {
            return Ok(());
        }
        self.codec.decode_into(self.content_type(), self.body(), dst)
    }

    /// Decode the body according to the response content type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.codec
            .lookup(self.content_type())?
            .decode(self.body())
    }

    /// Deserialize the body as JSON, whatever the content type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        crate::from_json(self.body())
    }

    /// Body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body().to_vec())
            .map_err(|err| Error::decode("text/plain", err))
    }
}
