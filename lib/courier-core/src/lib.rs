//! Core types for the courier fluent HTTP client.
//!
//! This crate is transport-agnostic and provides:
//! - [`Error`], [`HttpError`] and [`Result`] - Error handling
//! - [`Shared`] - Copy-on-write configuration values
//! - [`Hook`] and [`HookChain`] - Request interceptors
//! - [`Codec`], [`Format`], [`Body`], [`Payload`] and [`Destination`] - Content-type driven encoding
//! - [`Handlers`], [`Slot`] and [`Handler`] - Status-scoped response handlers
//! - [`RawResponse`] - Drained response seen by handlers
//! - [`Transport`] and [`ResponseBody`] - The capability used to send requests
//! - [`Arena`] - Pool of reusable byte buffers
//! - [`QueryMap`] - Ordered query parameters

pub mod arena;
pub mod codec;
mod error;
pub mod handler;
mod hook;
mod method;
pub mod prelude;
mod query;
mod response;
mod shared;
mod transport;

pub use arena::{Arena, PooledBuf};
pub use codec::{
    Body, Codec, Destination, Format, MIME_FORM, MIME_JSON, MIME_JSON_UTF8, MIME_MULTIPART_FORM,
    MIME_TEXT_PLAIN, MIME_TEXT_XML, MIME_XML, MIME_XML_UTF8, Payload, from_json, media_type,
    to_form,
};
pub use error::{BoxError, ERROR_SNIPPET_LIMIT, Error, HttpError, Result, UnexpectedStatus};
pub use handler::{Handler, Handlers, Slot, decode_response_body, read_body_as_error};
pub use hook::{Hook, HookChain};
pub use method::Method;
pub use query::QueryMap;
pub use response::RawResponse;
pub use shared::Shared;
pub use transport::{BodyStream, ResponseBody, Transport, TransportFn, TransportFuture, transport_fn};

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, HeaderValue, StatusCode, header};
