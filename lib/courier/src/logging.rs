//! Response logging observer.
//!
//! Logs every finished call using the `tracing` crate.

use std::sync::Arc;

use courier_core::{MIME_FORM, MIME_JSON, MIME_TEXT_XML, MIME_XML, media_type};
use http::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::response::Response;
use crate::settings::Observer;

const TEXTUAL_TYPES: [&str; 6] = [
    MIME_JSON,
    MIME_FORM,
    MIME_XML,
    MIME_TEXT_XML,
    "text/plain",
    "text/html",
];

/// Log level of the [`ResponseLogger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log every call at debug level.
    #[default]
    Debug,
    /// Log successful calls at info level and failures at warn level.
    Info,
}

/// Observer logging the method, URL, status, timing, request headers and
/// body, and error of each call.
///
/// Request bodies are only logged for textual content types.
///
/// # Example
///
/// ```ignore
/// use courier::{Client, Configure, ResponseLogger};
///
/// let logger = ResponseLogger::info();
/// let client = Client::new().on_response(move |response| logger.log(response));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseLogger {
    level: LogLevel,
}

impl ResponseLogger {
    /// Logger at the given level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Logger at info level.
    #[must_use]
    pub const fn info() -> Self {
        Self::new(LogLevel::Info)
    }

    /// Log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Log a finished call.
    pub fn log(&self, response: &Response) {
        let method = response.method();
        let url = response.url();
        let status = response.status_code();
        // Saturating conversion to u64
        let elapsed_ms = u64::try_from(response.elapsed().as_millis()).unwrap_or(u64::MAX);
        let request_headers = response.request().map(http::Request::headers);
        let request_body = response
            .request()
            .and_then(|request| request.headers().get(CONTENT_TYPE))
            .and_then(|value| value.to_str().ok())
            .filter(|content_type| is_textual(content_type))
            .and(response.request_body())
            .map(|body| String::from_utf8_lossy(body));

        match (self.level, response.error()) {
            (LogLevel::Debug, None) => debug!(
                %method,
                url,
                status,
                elapsed_ms,
                request_headers = ?request_headers,
                request_body = request_body.as_deref(),
                "request completed"
            ),
            (LogLevel::Debug, Some(err)) => debug!(
                %method,
                url,
                status,
                elapsed_ms,
                request_headers = ?request_headers,
                request_body = request_body.as_deref(),
                error = %err,
                "request failed"
            ),
            (LogLevel::Info, None) => info!(%method, url, status, elapsed_ms, "request completed"),
            (LogLevel::Info, Some(err)) => {
                warn!(%method, url, status, elapsed_ms, error = %err, "request failed");
            }
        }
    }

    /// Observer calling [`ResponseLogger::log`].
    #[must_use]
    pub fn observer(self) -> Observer {
        Arc::new(move |response: &Response| self.log(response))
    }
}

fn is_textual(content_type: &str) -> bool {
    let media = media_type(content_type);
    TEXTUAL_TYPES.iter().any(|textual| *textual == media)
}
