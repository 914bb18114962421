//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits for easy
//! glob importing:
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    Body, Client, Configure, Destination, Error, Format, HttpError, HyperTransport, Method, Payload,
    RawResponse, Request, Response, ResponseLogger, Result, Slot, StatusCode, Transport,
    TransportConfig, header,
};
pub use serde::{Deserialize, Serialize};
