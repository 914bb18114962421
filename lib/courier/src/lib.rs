//! Fluent HTTP client for Rust.
//!
//! Build requests with chained mutators, send them through a pluggable
//! [`Transport`], and route responses to status-scoped handlers that decode
//! or reject the body.
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[derive(Debug, Default, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let client = Client::new()
//!     .with_base_url("https://api.example.com")
//!     .header("x-api-key", "secret");
//!
//! let mut user = User::default();
//! client
//!     .get("/users/42")
//!     .query("fields", "id,name")
//!     .send_into(&mut user)
//!     .await
//!     .into_result()?;
//! ```
//!
//! A client is cheap to clone and safe to share: requests start from an
//! alias of the client configuration and copy a value only when they change
//! it.

mod client;
mod config;
mod connector;
mod default;
mod hyper_transport;
mod logging;
pub mod prelude;
mod request;
mod response;
mod service;
mod settings;

// Re-export client types
pub use client::Client;
pub use config::{TransportConfig, TransportConfigBuilder};
pub use connector::https_connector;
pub use default::{
    default_client, delete, delete_into, get, get_into, head, options, patch, patch_into, post,
    post_into, put, put_into,
};
pub use hyper_transport::HyperTransport;
pub use logging::{LogLevel, ResponseLogger};
pub use request::Request;
pub use response::Response;
pub use service::ServiceTransport;
pub use settings::{Configure, Observer, Settings};

// Re-export tower for transport composition
pub use tower;

// Re-export core types
pub use courier_core::{
    Arena, Body, BoxError, Codec, Destination, ERROR_SNIPPET_LIMIT, Error, Format, Handler, Handlers,
    Hook, HookChain, HttpError, MIME_FORM, MIME_JSON, MIME_JSON_UTF8, MIME_MULTIPART_FORM,
    MIME_TEXT_PLAIN, MIME_TEXT_XML, MIME_XML, MIME_XML_UTF8, Method, Payload, QueryMap,
    RawResponse, ResponseBody, Result, Shared, Slot, Transport, TransportFn, TransportFuture,
    UnexpectedStatus, decode_response_body, read_body_as_error, transport_fn,
};

// Re-export http types for status codes and headers
pub use courier_core::{HeaderMap, HeaderValue, StatusCode, header};

// Re-export crates used in public signatures
pub use bytes;
pub use http;
pub use url;
