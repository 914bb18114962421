//! Configuration shared by [`Client`](crate::Client) and
//! [`Request`](crate::Request).
//!
//! A request starts from an alias of its client's settings. Headers, query
//! parameters, hooks and handlers are [`Shared`] values, so the first change
//! made on either side copies the value and the other side never sees it.

use std::fmt;
use std::sync::Arc;

use courier_core::codec::MIME_JSON;
use courier_core::{
    Codec, Destination, Error, Format, Handlers, Hook, HookChain, QueryMap, RawResponse, Result,
    Shared, Slot, Transport, MIME_JSON_UTF8,
};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::Response;
use crate::logging::ResponseLogger;

/// Callback invoked once per call with the final [`Response`].
pub type Observer = Arc<dyn Fn(&Response) + Send + Sync>;

/// Configuration of a client or of a single request.
#[derive(Clone)]
pub struct Settings {
    pub(crate) headers: Shared<HeaderMap>,
    pub(crate) query: Shared<QueryMap>,
    pub(crate) hooks: Shared<HookChain>,
    pub(crate) handlers: Shared<Handlers>,
    pub(crate) codec: Codec,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) observer: Option<Observer>,
    pub(crate) ignore_404: bool,
    pub(crate) error: Option<Error>,
}

impl Settings {
    /// Settings without any header, hook, handler or observer.
    pub fn bare(transport: Arc<dyn Transport>) -> Self {
        Self {
            headers: Shared::default(),
            query: Shared::default(),
            hooks: Shared::default(),
            handlers: Shared::default(),
            codec: Codec::default(),
            transport,
            observer: None,
            ignore_404: false,
            error: None,
        }
    }

    /// Default settings: JSON `Accept` and `Content-Type`, the built-in
    /// handlers and a debug-level [`ResponseLogger`].
    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MIME_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(MIME_JSON_UTF8));

        Self {
            headers: Shared::new(headers),
            handlers: Shared::new(Handlers::with_defaults()),
            observer: Some(ResponseLogger::default().observer()),
            ..Self::bare(transport)
        }
    }

    /// Alias every value, for a request or a cloned client.
    #[must_use]
    pub fn inherit(&self) -> Self {
        self.clone()
    }

    /// Default headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.headers.get()
    }

    /// Default query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryMap {
        self.query.get()
    }

    /// Hook chain.
    #[must_use]
    pub fn hooks(&self) -> &HookChain {
        self.hooks.get()
    }

    /// Status handlers.
    #[must_use]
    pub fn handlers(&self) -> &Handlers {
        self.handlers.get()
    }

    /// Content codec.
    #[must_use]
    pub const fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Returns `true` if 404 responses skip the 4xx handler.
    #[must_use]
    pub const fn ignores_404(&self) -> bool {
        self.ignore_404
    }

    /// First configuration error, replayed by the send.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// `Content-Type` header, if set and valid text.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers().get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Returns `true` if both still alias the same header map.
    #[must_use]
    pub fn shares_headers_with(&self, other: &Self) -> bool {
        self.headers.ptr_eq(&other.headers)
    }

    /// Returns `true` if both still alias the same query map.
    #[must_use]
    pub fn shares_query_with(&self, other: &Self) -> bool {
        self.query.ptr_eq(&other.query)
    }

    /// Returns `true` if both still alias the same hook chain.
    #[must_use]
    pub fn shares_hooks_with(&self, other: &Self) -> bool {
        self.hooks.ptr_eq(&other.hooks)
    }

    pub(crate) fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| Error::invalid_header(format!("{name}: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| Error::invalid_header(format!("{name}: {err}")))?;
        Ok((name, value))
    }

    fn parse_headers<I, K, V>(pairs: I) -> Result<Vec<(HeaderName, HeaderValue)>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|(name, value)| Self::parse_header(name.as_ref(), value.as_ref()))
            .collect()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("headers", self.headers.get())
            .field("query", self.query.get())
            .field("hooks", self.hooks.get())
            .field("handlers", self.handlers.get())
            .field("codec", &self.codec)
            .field("observer", &self.observer.is_some())
            .field("ignore_404", &self.ignore_404)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fluent Mutators
// ============================================================================

/// Fluent configuration shared by [`Client`](crate::Client) and
/// [`Request`](crate::Request).
///
/// Invalid input (a bad header name, for instance) does not panic: the first
/// such error is recorded and returned by the send.
pub trait Configure: Sized {
    /// Settings being configured.
    fn settings(&self) -> &Settings;

    /// Mutable settings being configured.
    fn settings_mut(&mut self) -> &mut Settings;

    /// Append a header value.
    #[must_use]
    fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let settings = self.settings_mut();
        match Settings::parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                settings.headers.to_mut().append(name, value);
            }
            Err(err) => settings.fail(err),
        }
        self
    }

    /// Set a header, replacing its previous values.
    #[must_use]
    fn set_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let settings = self.settings_mut();
        match Settings::parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                settings.headers.to_mut().insert(name, value);
            }
            Err(err) => settings.fail(err),
        }
        self
    }

    /// Set several headers, each replacing the previous values of its name.
    ///
    /// Repeated names in `pairs` are all kept.
    #[must_use]
    fn headers<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let settings = self.settings_mut();
        match Settings::parse_headers(pairs) {
            Ok(pairs) if pairs.is_empty() => {}
            Ok(pairs) => {
                let headers = settings.headers.to_mut();
                for (name, _) in &pairs {
                    headers.remove(name);
                }
                for (name, value) in pairs {
                    headers.append(name, value);
                }
            }
            Err(err) => settings.fail(err),
        }
        self
    }

    /// Append several header values.
    #[must_use]
    fn header_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let settings = self.settings_mut();
        match Settings::parse_headers(pairs) {
            Ok(pairs) if pairs.is_empty() => {}
            Ok(pairs) => settings.headers.to_mut().extend(pairs),
            Err(err) => settings.fail(err),
        }
        self
    }

    /// Set the `Content-Type` header.
    #[must_use]
    fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.set_header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Replace the `Accept` header with the given media types.
    #[must_use]
    fn accepts<I, V>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let settings = self.settings_mut();
        match Settings::parse_headers(media_types.into_iter().map(|value| (ACCEPT.as_str(), value)))
        {
            Ok(values) if values.is_empty() => {}
            Ok(values) => {
                let headers = settings.headers.to_mut();
                headers.remove(ACCEPT);
                headers.extend(values);
            }
            Err(err) => settings.fail(err),
        }
        self
    }

    /// Append a media type to the `Accept` header.
    #[must_use]
    fn accept(self, media_type: impl AsRef<str>) -> Self {
        self.header(ACCEPT.as_str(), media_type)
    }

    /// Append a query parameter value.
    #[must_use]
    fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings_mut().query.to_mut().add(key, value);
        self
    }

    /// Set a query parameter, replacing its previous values.
    #[must_use]
    fn set_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings_mut().query.to_mut().set(key, value);
        self
    }

    /// Set several query parameters, each replacing the previous values of
    /// its key.
    #[must_use]
    fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let incoming: QueryMap = pairs.into_iter().collect();
        if !incoming.is_empty() {
            self.settings_mut().query.to_mut().replace_keys(&incoming);
        }
        self
    }

    /// Append several query parameter values.
    #[must_use]
    fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pairs = pairs.into_iter().peekable();
        if pairs.peek().is_some() {
            let query = self.settings_mut().query.to_mut();
            for (key, value) in pairs {
                query.add(key, value);
            }
        }
        self
    }

    /// Append a hook to the chain.
    #[must_use]
    fn add_hook(mut self, hook: impl Hook) -> Self {
        self.settings_mut().hooks.to_mut().push(Arc::new(hook));
        self
    }

    /// Replace the whole chain with a single hook.
    #[must_use]
    fn set_hook(mut self, hook: impl Hook) -> Self {
        self.settings_mut()
            .hooks
            .replace(HookChain::Single(Arc::new(hook)));
        self
    }

    /// Remove every hook.
    #[must_use]
    fn clear_hooks(mut self) -> Self {
        self.settings_mut().hooks.replace(HookChain::Empty);
        self
    }

    /// Handle every response with `handler`, whatever its status.
    #[must_use]
    fn handler<F>(self, handler: F) -> Self
    where
        F: Fn(Option<&mut dyn Destination>, &RawResponse) -> Result<()> + Send + Sync + 'static,
    {
        self.handler_for(Slot::All, handler)
    }

    /// Set the handler of a slot.
    #[must_use]
    fn handler_for<F>(mut self, slot: Slot, handler: F) -> Self
    where
        F: Fn(Option<&mut dyn Destination>, &RawResponse) -> Result<()> + Send + Sync + 'static,
    {
        self.settings_mut()
            .handlers
            .to_mut()
            .set(slot, Arc::new(handler));
        self
    }

    /// Remove the handler of a slot.
    #[must_use]
    fn clear_handler(mut self, slot: Slot) -> Self {
        self.settings_mut().handlers.to_mut().clear(slot);
        self
    }

    /// Remove every handler, responses are then accepted as is.
    #[must_use]
    fn clear_handlers(mut self) -> Self {
        self.settings_mut().handlers.replace(Handlers::new());
        self
    }

    /// Let 404 responses skip the 4xx handler.
    #[must_use]
    fn ignore_404(mut self, ignore: bool) -> Self {
        self.settings_mut().ignore_404 = ignore;
        self
    }

    /// Call `observer` once per call with the final response.
    #[must_use]
    fn on_response<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.settings_mut().observer = Some(Arc::new(observer));
        self
    }

    /// Remove the response observer.
    #[must_use]
    fn no_observer(mut self) -> Self {
        self.settings_mut().observer = None;
        self
    }

    /// Send through another transport.
    #[must_use]
    fn transport(mut self, transport: impl Transport) -> Self {
        self.settings_mut().transport = Arc::new(transport);
        self
    }

    /// Replace the content codec.
    #[must_use]
    fn codec(mut self, codec: Codec) -> Self {
        self.settings_mut().codec = codec;
        self
    }

    /// Register a format for a MIME type.
    #[must_use]
    fn register_format(mut self, content_type: &str, format: Format) -> Self {
        self.settings_mut().codec.register(content_type, format);
        self
    }
}

#[cfg(test)]
mod tests {
    use courier_core::{ResponseBody, transport_fn};

    use super::*;

    struct Holder(Settings);

    impl Configure for Holder {
        fn settings(&self) -> &Settings {
            &self.0
        }

        fn settings_mut(&mut self) -> &mut Settings {
            &mut self.0
        }
    }

    fn holder() -> Holder {
        let transport = transport_fn(|_: http::Request<bytes::Bytes>| async {
            Ok::<_, Error>(http::Response::new(ResponseBody::empty()))
        });
        Holder(Settings::with_defaults(Arc::new(transport)))
    }

    fn values<'a>(settings: &'a Settings, name: &str) -> Vec<&'a str> {
        settings
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    #[test]
    fn defaults() {
        let holder = holder();
        let settings = holder.settings();
        assert_eq!(values(settings, "accept"), ["application/json"]);
        assert_eq!(settings.content_type(), Some("application/json; charset=UTF-8"));
        assert!(settings.handlers().get(Slot::Success).is_some());
        assert!(settings.handlers().get(Slot::Default).is_some());
        assert!(settings.observer.is_some());
    }

    #[test]
    fn header_appends_and_set_header_replaces() {
        let holder = holder()
            .header("x-tag", "a")
            .header("x-tag", "b")
            .set_header("accept", "text/plain");
        assert_eq!(values(holder.settings(), "x-tag"), ["a", "b"]);
        assert_eq!(values(holder.settings(), "accept"), ["text/plain"]);
    }

    #[test]
    fn headers_replace_per_name() {
        let holder = holder()
            .header("x-tag", "a")
            .headers([("x-tag", "b"), ("x-tag", "c"), ("x-other", "d")]);
        assert_eq!(values(holder.settings(), "x-tag"), ["b", "c"]);
        assert_eq!(values(holder.settings(), "x-other"), ["d"]);
    }

    #[test]
    fn accepts_replace_and_accept_appends() {
        let holder = holder().accepts(["text/html", "text/plain"]).accept("*/*");
        assert_eq!(values(holder.settings(), "accept"), ["text/html", "text/plain", "*/*"]);
    }

    #[test]
    fn invalid_header_is_recorded_once() {
        let holder = holder()
            .header("bad header", "x")
            .set_header("x-ok", "bad\nvalue");
        let err = holder.settings().error().expect("recorded");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("bad header"));
    }

    #[test]
    fn empty_input_does_not_copy() {
        let parent = holder();
        let child = Holder(parent.settings().inherit())
            .headers(Vec::<(&str, &str)>::new())
            .queries(Vec::<(String, String)>::new())
            .query_pairs(Vec::<(String, String)>::new())
            .header_pairs(Vec::<(&str, &str)>::new());
        assert!(child.settings().shares_headers_with(parent.settings()));
        assert!(child.settings().shares_query_with(parent.settings()));
    }

    #[test]
    fn queries_replace_per_key() {
        let holder = holder()
            .query("page", "1")
            .query("tag", "a")
            .queries([("page", "2")])
            .query_pairs([("tag", "b")]);
        let query = holder.settings().query();
        assert_eq!(query.get_all("page"), ["2"]);
        assert_eq!(query.get_all("tag"), ["a", "b"]);
    }

    #[test]
    fn set_hook_replaces_chain() {
        let hook = |req: http::Request<bytes::Bytes>| -> Result<_> { Ok(req) };
        let holder = holder().add_hook(hook).add_hook(hook).set_hook(hook);
        assert_eq!(holder.settings().hooks().len(), 1);
        let holder = holder.clear_hooks();
        assert!(holder.settings().hooks().is_empty());
    }

    #[test]
    fn handler_slots() {
        let holder = holder()
            .handler_for(Slot::ClientError, |_, _| Ok(()))
            .clear_handler(Slot::Default);
        let handlers = holder.settings().handlers();
        assert!(handlers.get(Slot::ClientError).is_some());
        assert!(handlers.get(Slot::Default).is_none());

        let holder = holder.clear_handlers();
        assert!(holder.settings().handlers().is_empty());
    }

    #[test]
    fn register_format() {
        let holder = holder().register_format("application/vnd.api+json", Format::Json);
        assert_eq!(
            holder
                .settings()
                .codec()
                .lookup(Some("application/vnd.api+json"))
                .expect("registered"),
            Format::Json
        );
    }
}
