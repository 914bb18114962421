//! Error types for courier.

use std::fmt;
use std::sync::Arc;

use derive_more::{Display, From};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::response::RawResponse;

/// A shareable, type-erased error supplied by user code (hooks, handlers).
pub type BoxError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Maximum number of body bytes kept in [`HttpError::data`] by
/// [`HttpError::from_response`].
pub const ERROR_SNIPPET_LIMIT: usize = 4096;

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for courier operations.
///
/// Variants fall into five groups: configuration (`InvalidUrl`,
/// `InvalidHeader`, `InvalidRequest`), encoding (`Encode`,
/// `MissingContentType`, `UnsupportedContentType`, `Io`), hooks (`Hook`),
/// transport (`Connection`, `Tls`, `Timeout`) and response handling
/// (`Http`, `Decode`, `JsonDeserialization`, `Handler`).
#[derive(Debug, Clone, Display, From)]
pub enum Error {
    /// The request URL could not be resolved.
    #[display("invalid URL: {_0}")]
    #[from(skip)]
    InvalidUrl(String),

    /// A header name or value is not valid.
    #[display("invalid header: {_0}")]
    #[from(skip)]
    InvalidHeader(String),

    /// The prepared request could not be built.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(String),

    /// A structured value or a response body needs a `Content-Type`.
    #[display("missing header Content-Type")]
    #[from(skip)]
    MissingContentType,

    /// No codec entry is registered for the content type.
    #[display("unsupported Content-Type '{_0}'")]
    #[from(skip)]
    UnsupportedContentType(String),

    /// A value could not be encoded for the content type.
    #[display("cannot encode body as {content_type}: {message}")]
    #[from(skip)]
    Encode {
        /// Content type used for encoding.
        content_type: String,
        /// Error message.
        message: String,
    },

    /// A response body could not be decoded for the content type.
    #[display("cannot decode body from {content_type}: {message}")]
    #[from(skip)]
    Decode {
        /// Content type used for decoding.
        content_type: String,
        /// Error message.
        message: String,
    },

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Reading or writing a body stream failed.
    #[display("I/O error: {_0}")]
    #[from(skip)]
    Io(String),

    /// A hook rejected the request.
    #[display("hook error: {_0}")]
    #[from(skip)]
    Hook(BoxError),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Structured HTTP error, usually produced by a status handler.
    #[display("{_0}")]
    #[from]
    Http(HttpError),

    /// Custom error returned by a user handler.
    #[display("{_0}")]
    #[from(skip)]
    Handler(BoxError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hook(err) | Self::Handler(err) => Some(&**err),
            Self::Http(err) => err.source(),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl Error {
    /// Create an invalid URL error.
    #[must_use]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl(message.into())
    }

    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an encoding error.
    #[must_use]
    pub fn encode(content_type: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Encode {
            content_type: content_type.into(),
            message: message.to_string(),
        }
    }

    /// Create a decoding error.
    #[must_use]
    pub fn decode(content_type: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            content_type: content_type.into(),
            message: message.to_string(),
        }
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised by a hook.
    #[must_use]
    pub fn hook(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Hook(Arc::from(err.into()))
    }

    /// Wrap an error raised by a custom response handler.
    #[must_use]
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(Arc::from(err.into()))
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if a hook rejected the request.
    #[must_use]
    pub const fn is_hook(&self) -> bool {
        matches!(self, Self::Hook(_))
    }

    /// Returns `true` if the request could not be configured.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::InvalidHeader(_) | Self::InvalidRequest(_)
        )
    }

    /// The structured HTTP error, if this is one.
    #[must_use]
    pub const fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code carried by a structured error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http(err) if err.code > 0 => Some(err.code),
            _ => None,
        }
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Look for a caller-defined error type in hook and handler errors.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Hook(err) | Self::Handler(err) => err.downcast_ref(),
            Self::Http(err) => err.cause()?.downcast_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// Structured HTTP Error
// ============================================================================

/// Error reported by the built-in status handler for unexpected status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("got status code {_0}")]
pub struct UnexpectedStatus(pub u16);

impl std::error::Error for UnexpectedStatus {}

/// Structured error describing a failed exchange.
///
/// Rendered as `method=..., url=..., statuscode=..., data=..., err=...`, where
/// the status code, data and error parts only appear when set. Serializes the
/// same way, omitting `code`, `data` and `err` when empty.
#[derive(Debug, Clone, Default)]
pub struct HttpError {
    method: String,
    url: String,
    code: u16,
    data: String,
    err: Option<BoxError>,
}

impl HttpError {
    /// Create an error for a method and URL.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Build an error from a response with an unexpected status.
    ///
    /// At most [`ERROR_SNIPPET_LIMIT`] body bytes are kept, cut on a character
    /// boundary and decoded lossily.
    #[must_use]
    pub fn from_response(response: &RawResponse) -> Self {
        let status = response.status();
        Self::new(response.method().as_str(), response.uri().to_string())
            .with_code(status)
            .with_data(body_snippet(response.body()))
            .with_err(UnexpectedStatus(status))
    }

    /// Set the status code.
    #[must_use]
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Set the data (usually a body snippet).
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the underlying cause.
    #[must_use]
    pub fn with_err(mut self, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.err = Some(Arc::from(err.into()));
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Status code, `0` when unknown.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Attached data.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Underlying cause.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.err.as_deref()
    }
}

fn body_snippet(body: &[u8]) -> String {
    let mut end = body.len().min(ERROR_SNIPPET_LIMIT);
    // Never cut inside a UTF-8 sequence: step back over continuation bytes.
    while end > 0 && body.get(end).is_some_and(|byte| byte & 0xC0 == 0x80) {
        end -= 1;
    }
    String::from_utf8_lossy(body.get(..end).unwrap_or(body)).into_owned()
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method={}, url={}", self.method, self.url)?;
        if self.code > 0 {
            write!(f, ", statuscode={}", self.code)?;
        }
        if !self.data.is_empty() {
            write!(f, ", data={}", self.data)?;
        }
        if let Some(err) = &self.err {
            write!(f, ", err={err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl Serialize for HttpError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("method", &self.method)?;
        map.serialize_entry("url", &self.url)?;
        if self.code > 0 {
            map.serialize_entry("code", &self.code)?;
        }
        if !self.data.is_empty() {
            map.serialize_entry("data", &self.data)?;
        }
        if let Some(err) = &self.err {
            map.serialize_entry("err", &err.to_string())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use insta::assert_snapshot;

    use super::*;

    #[derive(Debug, Display, derive_more::Error)]
    #[display("quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn body_snippet_stops_on_char_boundary() {
        let mut body = vec![b'a'; ERROR_SNIPPET_LIMIT - 1];
        body.extend_from_slice("é and more".as_bytes());

        let snippet = body_snippet(&body);
        assert_eq!(snippet.len(), ERROR_SNIPPET_LIMIT - 1);
        assert!(!snippet.contains('\u{FFFD}'));
        assert_eq!(body_snippet("short é".as_bytes()), "short é");
    }

    #[test]
    fn error_display() {
        assert_eq!(Error::Timeout.to_string(), "request timeout");
        assert_eq!(
            Error::connection("failed to connect").to_string(),
            "connection error: failed to connect"
        );
        assert_eq!(
            Error::MissingContentType.to_string(),
            "missing header Content-Type"
        );
        assert_eq!(
            Error::UnsupportedContentType("text/csv".to_string()).to_string(),
            "unsupported Content-Type 'text/csv'"
        );
        assert_eq!(
            Error::json_deserialization("user.address.city", "missing field `city`").to_string(),
            "JSON deserialization error at 'user.address.city': missing field `city`"
        );
    }

    #[test]
    fn http_error_display_omits_empty_fields() {
        let err = HttpError::new("GET", "http://localhost?k=v");
        assert_snapshot!(err.to_string(), @"method=GET, url=http://localhost?k=v");

        let err = err.with_code(500).with_data("boom");
        assert_snapshot!(
            err.to_string(),
            @"method=GET, url=http://localhost?k=v, statuscode=500, data=boom"
        );

        let err = err.with_err(UnexpectedStatus(500));
        assert_snapshot!(
            err.to_string(),
            @"method=GET, url=http://localhost?k=v, statuscode=500, data=boom, err=got status code 500"
        );
    }

    #[test]
    fn http_error_json_omits_empty_fields() {
        let err = HttpError::new("GET", "http://localhost?k=v").with_err(QuotaExceeded);
        let json = serde_json::to_string(&err).expect("serialize");
        assert_snapshot!(json, @r#"{"method":"GET","url":"http://localhost?k=v","err":"quota exceeded"}"#);

        let err = HttpError::new("POST", "http://localhost")
            .with_code(404)
            .with_data("missing");
        let json = serde_json::to_string(&err).expect("serialize");
        assert_snapshot!(json, @r#"{"method":"POST","url":"http://localhost","code":404,"data":"missing"}"#);
    }

    #[test]
    fn http_error_exposes_cause() {
        let err = HttpError::new("GET", "http://localhost").with_err(QuotaExceeded);
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "quota exceeded");
        assert!(err.cause().is_some_and(|cause| cause.is::<QuotaExceeded>()));
    }

    #[test]
    fn error_status() {
        let err = Error::from(HttpError::new("GET", "/").with_code(404));
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());

        let err = Error::from(HttpError::new("GET", "/"));
        assert_eq!(err.status(), None);

        assert_eq!(Error::Timeout.status(), None);
        assert!(!Error::Timeout.is_not_found());
    }

    #[test]
    fn error_predicates() {
        assert!(Error::Timeout.is_timeout());
        assert!(Error::connection("refused").is_connection());
        assert!(Error::hook(QuotaExceeded).is_hook());
        assert!(Error::invalid_url("nope").is_configuration());
        assert!(!Error::Timeout.is_configuration());
    }

    #[test]
    fn custom_errors_survive_wrapping() {
        let err = Error::handler(QuotaExceeded);
        assert!(err.downcast_ref::<QuotaExceeded>().is_some());
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("quota exceeded")
        );

        let err = Error::from(HttpError::new("GET", "/").with_err(QuotaExceeded));
        assert!(err.downcast_ref::<QuotaExceeded>().is_some());
    }

    #[test]
    fn error_is_clone() {
        let err = Error::hook(QuotaExceeded);
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn url_parse_error_is_configuration() {
        let err = Error::from(url::Url::parse("not a url").expect_err("invalid"));
        assert!(err.is_configuration());
    }
}
