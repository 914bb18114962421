//! Outcome of a call.

use std::io::Write;
use std::time::Duration;

use bytes::Bytes;
use courier_core::{Error, HttpError, RawResponse, Result};
use http::HeaderMap;
use http::header::CONTENT_LENGTH;

/// Outcome of a call: the exchanged messages, the timing and the error, if
/// any.
///
/// The request and raw response are absent when the call failed before
/// reaching the transport or before a response arrived.
#[derive(Debug)]
pub struct Response {
    method: http::Method,
    pub(crate) url: String,
    pub(crate) elapsed: Duration,
    request_body: Option<Bytes>,
    pub(crate) request: Option<http::Request<Bytes>>,
    pub(crate) raw: Option<RawResponse>,
    pub(crate) error: Option<Error>,
}

impl Response {
    pub(crate) fn new(method: http::Method, url: String, request_body: Option<Bytes>) -> Self {
        Self {
            method,
            url,
            elapsed: Duration::ZERO,
            request_body,
            request: None,
            raw: None,
            error: None,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &http::Method {
        &self.method
    }

    /// URL of the call, query parameters included once they were merged.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Time spent sending the request and reading the response body.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Body staged on the request.
    #[must_use]
    pub const fn request_body(&self) -> Option<&Bytes> {
        self.request_body.as_ref()
    }

    /// Request handed to the transport, after hooks.
    #[must_use]
    pub const fn request(&self) -> Option<&http::Request<Bytes>> {
        self.request.as_ref()
    }

    /// Drained transport response.
    #[must_use]
    pub const fn raw_response(&self) -> Option<&RawResponse> {
        self.raw.as_ref()
    }

    /// HTTP status code, `0` if no response arrived.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.raw.as_ref().map_or(0, RawResponse::status)
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.raw.as_ref().map(RawResponse::headers)
    }

    /// `Content-Length` header, or the drained body length without it.
    ///
    /// `0` if no response arrived.
    #[must_use]
    pub fn content_length(&self) -> u64 {
        let Some(raw) = &self.raw else {
            return 0;
        };
        raw.header(CONTENT_LENGTH.as_str())
            .and_then(|value| value.parse().ok())
            .unwrap_or(raw.body().len() as u64)
    }

    /// `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.raw.as_ref()?.content_type()
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.raw.as_ref().map(RawResponse::body)
    }

    /// Response body as text.
    ///
    /// Fails with the call error if there is one.
    pub fn text(&self) -> Result<String> {
        self.available()?.text()
    }

    /// Write the response body to `writer`, returning the number of bytes.
    ///
    /// Fails with the call error if there is one.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<u64> {
        let body = self.available()?.body();
        writer.write_all(body)?;
        Ok(body.len() as u64)
    }

    /// Error of the call.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns `true` if the call succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Consume into the call result.
    ///
    /// [`Error::Http`] errors are returned unchanged. Any other error is
    /// wrapped in an [`HttpError`] carrying the method, URL and status code,
    /// with the original error as its cause.
    pub fn into_result(self) -> Result<()> {
        match self.error {
            None => Ok(()),
            Some(err @ Error::Http(_)) => Err(err),
            Some(err) => {
                let status = self.raw.as_ref().map_or(0, RawResponse::status);
                Err(HttpError::new(self.method.as_str(), self.url)
                    .with_code(status)
                    .with_err(err)
                    .into())
            }
        }
    }

    /// Like [`Response::into_result`], also returning the status code.
    pub fn into_result_with_status(self) -> (u16, Result<()>) {
        let status = self.status_code();
        (status, self.into_result())
    }

    fn available(&self) -> Result<&RawResponse> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.raw
            .as_ref()
            .ok_or_else(|| Error::invalid_request("no response received"))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use assert2::{check, let_assert};
    use courier_core::{Codec, HttpError};
    use insta::assert_snapshot;

    use super::*;

    fn raw(status: u16, body: &'static str) -> RawResponse {
        let inner = http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain")
            .body(Bytes::from_static(body.as_bytes()))
            .expect("response");
        RawResponse::new(
            http::Method::GET,
            http::Uri::from_static("http://localhost/items"),
            inner,
            Codec::default(),
        )
    }

    fn response(raw: Option<RawResponse>, error: Option<Error>) -> Response {
        let mut response = Response::new(
            http::Method::GET,
            "http://localhost/items".to_string(),
            None,
        );
        response.raw = raw;
        response.error = error;
        response
    }

    #[test]
    fn accessors_without_response() {
        let response = response(None, Some(Error::connection("refused")));
        check!(response.status_code() == 0);
        check!(response.content_length() == 0);
        check!(response.content_type().is_none());
        check!(response.body().is_none());
        check!(!response.is_ok());
    }

    #[test]
    fn accessors_with_response() {
        let response = response(Some(raw(200, "hello")), None);
        check!(response.status_code() == 200);
        check!(response.content_length() == 5);
        check!(response.content_type() == Some("text/plain"));
        check!(response.text().expect("text") == "hello");

        let mut out = Vec::new();
        check!(response.write_to(&mut out).expect("write") == 5);
        check!(out == b"hello");
    }

    #[test]
    fn text_fails_with_call_error() {
        let response = response(Some(raw(500, "boom")), Some(Error::Timeout));
        let_assert!(Err(Error::Timeout) = response.text());
    }

    #[test]
    fn into_result_wraps_other_errors() {
        let response = response(Some(raw(200, "{")), Some(Error::decode("application/json", "eof")));
        let (status, result) = response.into_result_with_status();
        check!(status == 200);
        let_assert!(Err(Error::Http(err)) = result);
        assert_snapshot!(
            err.to_string(),
            @"method=GET, url=http://localhost/items, statuscode=200, err=cannot decode body from application/json: eof"
        );
        check!(err.source().is_some());
    }

    #[test]
    fn into_result_keeps_http_errors() {
        let http = HttpError::new("GET", "http://localhost/items").with_code(404);
        let response = response(Some(raw(404, "")), Some(Error::Http(http)));
        let_assert!(Err(Error::Http(err)) = response.into_result());
        check!(err.code() == 404);
        check!(err.cause().is_none());
    }

    #[test]
    fn into_result_ok() {
        check!(response(Some(raw(204, "")), None).into_result().is_ok());
    }
}
