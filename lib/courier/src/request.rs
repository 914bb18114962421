//! Per-call request builder.

use std::time::{Duration, Instant};

use bytes::Bytes;
use courier_core::{
    Arena, Body, Destination, Error, MIME_FORM, MIME_JSON_UTF8, MIME_XML_UTF8, Payload, RawResponse,
    Result,
};
use serde::Serialize;
use tracing::{Instrument, trace, trace_span};
use url::Url;

use crate::response::Response;
use crate::settings::{Configure, Settings};

/// A request being built, consumed by one of its `send` methods.
///
/// Starts from an alias of the client configuration: the client is never
/// affected by the mutators called here.
#[derive(Debug)]
pub struct Request {
    method: http::Method,
    target: String,
    url: Result<Url>,
    settings: Settings,
    body: Option<Bytes>,
    timeout: Option<Duration>,
}

impl Request {
    pub(crate) fn new(
        method: http::Method,
        target: &str,
        url: Result<Url>,
        settings: Settings,
    ) -> Self {
        Self {
            method,
            target: target.to_string(),
            url,
            settings,
            body: None,
            timeout: None,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &http::Method {
        &self.method
    }

    /// Resolved URL, before query parameters are merged.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref().ok()
    }

    /// Staged body.
    #[must_use]
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    // ========================================================================
    // Body
    // ========================================================================

    /// Set a raw body, sent as is.
    ///
    /// Readers are drained immediately.
    #[must_use]
    pub fn body(mut self, payload: impl Into<Payload>) -> Self {
        match payload.into().into_bytes(Arena::global()) {
            Ok(bytes) => self.body = Some(bytes),
            Err(err) => self.settings.fail(err),
        }
        self
    }

    /// Set a body of any shape: raw payloads are sent as is, structured
    /// values are encoded like [`Request::body_value`].
    #[must_use]
    pub fn set_body(self, body: impl Into<Body>) -> Self {
        match body.into() {
            Body::Empty => self.clear_body(),
            Body::Raw(payload) => self.body(payload),
            Body::Value(value) => self.body_value(&value),
        }
    }

    /// Encode a value according to the current `Content-Type` header.
    ///
    /// Strings and byte vectors are values here too and get encoded: use
    /// [`Request::body`] or [`Request::set_body`] to send them as is.
    #[must_use]
    pub fn body_value<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        let mut buf = Arena::global().acquire();
        match self
            .settings
            .codec()
            .encode(self.settings.content_type(), value, &mut buf)
        {
            Ok(()) => self.body = Some(buf.to_bytes()),
            Err(err) => self.settings.fail(err),
        }
        self
    }

    /// Send a value as JSON.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.content_type(MIME_JSON_UTF8).body_value(value)
    }

    /// Send a value as a URL-encoded form.
    #[must_use]
    pub fn form<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.content_type(MIME_FORM).body_value(value)
    }

    /// Send a value as XML.
    #[must_use]
    pub fn xml<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.content_type(MIME_XML_UTF8).body_value(value)
    }

    /// Remove the body.
    #[must_use]
    pub fn clear_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Fail with [`Error::Timeout`] if the call takes longer than `timeout`,
    /// body included.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send the request, routing the response through the status handlers
    /// without decode destination.
    pub async fn send(self) -> Response {
        self.execute(|settings, raw| {
            settings
                .handlers()
                .dispatch(raw, settings.ignores_404(), None)
        })
        .await
    }

    /// Send the request, routing the response through the status handlers
    /// with `dst` as decode destination.
    pub async fn send_into<D: Destination>(self, dst: &mut D) -> Response {
        self.execute(move |settings, raw| {
            settings
                .handlers()
                .dispatch(raw, settings.ignores_404(), Some(dst))
        })
        .await
    }

    /// Send the request and hand the response to `f` instead of the status
    /// handlers.
    pub async fn send_with<F>(self, f: F) -> Response
    where
        F: FnOnce(&RawResponse) -> Result<()>,
    {
        self.execute(move |_, raw| f(raw)).await
    }

    async fn execute<F>(self, route: F) -> Response
    where
        F: FnOnce(&Settings, &RawResponse) -> Result<()>,
    {
        let span = trace_span!("courier.request", method = %self.method, url = %self.target);
        self.run(route).instrument(span).await
    }

    async fn run<F>(self, route: F) -> Response
    where
        F: FnOnce(&Settings, &RawResponse) -> Result<()>,
    {
        let Self {
            method,
            target,
            url,
            settings,
            body,
            timeout,
        } = self;

        let display_url = url.as_ref().map_or_else(|_| target.clone(), Url::to_string);
        let mut response = Response::new(method.clone(), display_url, body.clone());

        match Self::exchange(&settings, method, url, body, timeout, &mut response).await {
            Ok(raw) => {
                if let Err(err) = route(&settings, &raw) {
                    trace!(status = raw.status(), error = %err, "response handler failed");
                    response.error = Some(err);
                }
                response.raw = Some(raw);
            }
            Err(err) => {
                trace!(error = %err, "request failed before a response was handled");
                response.error = Some(err);
            }
        }

        if let Some(observer) = &settings.observer {
            observer(&response);
        }
        response
    }

    async fn exchange(
        settings: &Settings,
        method: http::Method,
        url: Result<Url>,
        body: Option<Bytes>,
        timeout: Option<Duration>,
        response: &mut Response,
    ) -> Result<RawResponse> {
        if let Some(err) = settings.error() {
            return Err(err.clone());
        }
        let mut url = url?;
        settings.query().merge_into(&mut url);
        response.url = url.to_string();

        let uri: http::Uri = url
            .as_str()
            .parse()
            .map_err(|err: http::uri::InvalidUri| Error::invalid_url(err.to_string()))?;
        let mut request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body.unwrap_or_default())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        *request.headers_mut() = settings.headers().clone();

        let request = settings.hooks().transform(request)?;
        response.request = Some(snapshot(&request));
        let method = request.method().clone();
        let uri = request.uri().clone();

        let started = Instant::now();
        let transfer = async {
            let (parts, body) = settings.transport().send(request).await?.into_parts();
            let body = body.collect(Arena::global()).await?;
            Ok::<_, Error>(http::Response::from_parts(parts, body))
        };
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, transfer)
                .await
                .unwrap_or(Err(Error::Timeout)),
            None => transfer.await,
        };
        response.elapsed = started.elapsed();

        Ok(RawResponse::new(method, uri, result?, settings.codec().clone()))
    }
}

fn snapshot(request: &http::Request<Bytes>) -> http::Request<Bytes> {
    let mut copy = http::Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    copy
}

impl Configure for Request {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use courier_core::{ResponseBody, transport_fn};

    use super::*;
    use crate::Client;

    fn client() -> Client {
        Client::with_transport(transport_fn(|_: http::Request<Bytes>| async {
            Ok::<_, Error>(http::Response::new(ResponseBody::empty()))
        }))
        .with_base_url("http://localhost")
    }

    #[derive(Serialize)]
    struct Login {
        user: String,
    }

    fn login() -> Login {
        Login {
            user: "alice".to_string(),
        }
    }

    #[test]
    fn body_value_uses_content_type() {
        let request = client().post("/login").body_value(&login());
        check!(request.body_bytes().map(Bytes::as_ref) == Some(&br#"{"user":"alice"}"#[..]));

        let request = client().post("/login").form(&login());
        check!(request.body_bytes().map(Bytes::as_ref) == Some(&b"user=alice"[..]));
        check!(request.settings().content_type() == Some(MIME_FORM));
    }

    #[test]
    fn raw_body_skips_codec() {
        let request = client()
            .post("/upload")
            .content_type("text/csv")
            .body("a,b\n1,2");
        check!(request.settings().error().is_none());
        check!(request.body_bytes().map(Bytes::as_ref) == Some(&b"a,b\n1,2"[..]));
    }

    #[test]
    fn set_body_passes_raw_payloads_through() {
        let request = client()
            .post("/notes")
            .content_type("text/plain")
            .set_body("hello");
        check!(request.settings().error().is_none());
        check!(request.body_bytes().map(Bytes::as_ref) == Some(&b"hello"[..]));

        let request = client().post("/notes").set_body(vec![0_u8, 1, 2]);
        check!(request.body_bytes().map(Bytes::as_ref) == Some(&[0_u8, 1, 2][..]));

        let request = client().post("/notes").set_body("x").set_body(());
        check!(request.body_bytes().is_none());
    }

    #[test]
    fn set_body_encodes_structured_values() {
        let body = Body::value(&login()).expect("value");
        let request = client().post("/login").set_body(body);
        check!(request.body_bytes().map(Bytes::as_ref) == Some(&br#"{"user":"alice"}"#[..]));

        let body = Body::value(&login()).expect("value");
        let request = client().post("/login").content_type(MIME_FORM).set_body(body);
        check!(request.body_bytes().map(Bytes::as_ref) == Some(&b"user=alice"[..]));
    }

    #[test]
    fn set_hook_then_add_hook_leaves_client_chain() {
        let hook = |request: http::Request<Bytes>| -> Result<_> { Ok(request) };
        let client = client().add_hook(hook).add_hook(hook);
        check!(matches!(client.settings().hooks(), courier_core::HookChain::Sequence(_)));

        let request = client.get("/").set_hook(hook).add_hook(hook);

        check!(client.settings().hooks().len() == 2);
        check!(request.settings().hooks().len() == 2);
        check!(!request.settings().shares_hooks_with(client.settings()));

        let other = client.get("/").add_hook(hook);
        check!(other.settings().hooks().len() == 3);
        check!(client.settings().hooks().len() == 2);
    }

    #[test]
    fn structured_body_without_content_type_fails() {
        let request = client()
            .post("/login")
            .clear_body()
            .set_header("content-type", "")
            .body_value(&login());
        let_assert!(Some(Error::MissingContentType) = request.settings().error());
        check!(request.body_bytes().is_none());
    }

    #[test]
    fn unsupported_content_type_fails() {
        let request = client()
            .post("/login")
            .content_type("text/csv")
            .body_value(&login());
        let_assert!(Some(Error::UnsupportedContentType(media)) = request.settings().error());
        check!(media == "text/csv");
    }

    #[test]
    fn request_mutations_do_not_reach_client() {
        let client = client();
        let request = client.get("/").header("x-request", "1").query("k", "v");

        check!(!client.settings().headers().contains_key("x-request"));
        check!(client.settings().query().is_empty());
        check!(!request.settings().shares_headers_with(client.settings()));
        check!(request.settings().shares_hooks_with(client.settings()));
    }

    #[test]
    fn snapshot_copies_request_parts() {
        let mut request = http::Request::new(Bytes::from_static(b"payload"));
        *request.method_mut() = http::Method::PUT;
        request
            .headers_mut()
            .insert("x-a", http::HeaderValue::from_static("1"));

        let copy = snapshot(&request);
        check!(copy.method() == http::Method::PUT);
        check!(copy.headers().get("x-a").is_some());
        check!(copy.body().as_ref() == b"payload");
    }
}
