//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Body, Codec, Destination, Error, Format, Handler, Handlers, Hook, HookChain, HttpError, Method,
    Payload, RawResponse, ResponseBody, Result, Slot, Transport, transport_fn,
};
