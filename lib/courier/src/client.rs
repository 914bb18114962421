//! Long-lived client holding the default configuration.

use std::sync::Arc;

use courier_core::{Error, Result, Transport};
use url::Url;

use crate::hyper_transport::HyperTransport;
use crate::request::Request;
use crate::settings::{Configure, Settings};

/// HTTP client with default headers, query parameters, hooks and handlers.
///
/// Cloning a client and building a request are both O(1): the configuration
/// is aliased and only copied by the first change made on either side.
///
/// # Example
///
/// ```ignore
/// use courier::prelude::*;
///
/// let client = Client::new()
///     .with_base_url("https://api.example.com/v1/")
///     .header("x-api-key", "secret");
///
/// let mut user = User::default();
/// client.get("users/42").send_into(&mut user).await.into_result()?;
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    settings: Settings,
}

impl Client {
    /// Client using [`HyperTransport`] and the default settings.
    ///
    /// Requests accept and send JSON, 2xx bodies are decoded into the
    /// destination, other statuses except 3xx become an
    /// [`HttpError`](courier_core::HttpError), and every call is logged at
    /// debug level.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(HyperTransport::new())
    }

    /// Client using `transport` and the default settings.
    #[must_use]
    pub fn with_transport(transport: impl Transport) -> Self {
        Self::from_settings(Settings::with_defaults(Arc::new(transport)))
    }

    /// Client without default headers, handlers or observer.
    #[must_use]
    pub fn bare(transport: impl Transport) -> Self {
        Self::from_settings(Settings::bare(Arc::new(transport)))
    }

    /// Client using the given settings.
    #[must_use]
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            base_url: String::new(),
            settings,
        }
    }

    /// Set the base URL joined with relative request URLs.
    ///
    /// Trailing slashes are removed.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// Base URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request.
    ///
    /// `url` is resolved against the base URL:
    /// - `http://` and `https://` URLs are used as is
    /// - a path starting with `/` replaces the path of the base URL
    /// - any other path is appended to the base URL
    ///
    /// A resolution error is reported by the send.
    #[must_use]
    pub fn request(&self, method: impl Into<http::Method>, url: impl AsRef<str>) -> Request {
        let target = url.as_ref();
        let resolved = self.resolve_url(target);
        Request::new(method.into(), target, resolved, self.settings.inherit())
    }

    /// Start a GET request.
    #[must_use]
    pub fn get(&self, url: impl AsRef<str>) -> Request {
        self.request(http::Method::GET, url)
    }

    /// Start a PUT request.
    #[must_use]
    pub fn put(&self, url: impl AsRef<str>) -> Request {
        self.request(http::Method::PUT, url)
    }

    /// Start a HEAD request.
    #[must_use]
    pub fn head(&self, url: impl AsRef<str>) -> Request {
        self.request(http::Method::HEAD, url)
    }

    /// Start a POST request.
    #[must_use]
    pub fn post(&self, url: impl AsRef<str>) -> Request {
        self.request(http::Method::POST, url)
    }

    /// Start a PATCH request.
    #[must_use]
    pub fn patch(&self, url: impl AsRef<str>) -> Request {
        self.request(http::Method::PATCH, url)
    }

    /// Start a DELETE request.
    #[must_use]
    pub fn delete(&self, url: impl AsRef<str>) -> Request {
        self.request(http::Method::DELETE, url)
    }

    /// Start an OPTIONS request.
    #[must_use]
    pub fn options(&self, url: impl AsRef<str>) -> Request {
        self.request(http::Method::OPTIONS, url)
    }

    fn resolve_url(&self, target: &str) -> Result<Url> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(Url::parse(target)?);
        }
        if self.base_url.is_empty() {
            return Err(Error::invalid_url(format!("invalid request url '{target}'")));
        }

        let base = Url::parse(&self.base_url)?;
        if target.is_empty() {
            Ok(base)
        } else if target.starts_with('/') {
            Ok(base.join(target)?)
        } else {
            Ok(Url::parse(&format!("{}/{target}", self.base_url))?)
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Configure for Client {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
