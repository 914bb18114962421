//! Status-scoped response handlers.
//!
//! A [`Handlers`] table holds up to one handler per [`Slot`]. For a given
//! response, the first matching slot in this order wins:
//!
//! 1. [`Slot::All`]
//! 2. the slot of the status class (1xx to 5xx), except a 404 when 404s are
//!    ignored
//! 3. [`Slot::Default`]
//!
//! When nothing matches, the response is accepted as is.

use std::fmt;
use std::sync::Arc;

use crate::codec::Destination;
use crate::error::HttpError;
use crate::response::RawResponse;
use crate::Result;

/// Response handler.
///
/// Receives the decode destination, if the caller gave one, and the drained
/// response. Its error becomes the outcome of the call.
pub type Handler =
    Arc<dyn Fn(Option<&mut dyn Destination>, &RawResponse) -> Result<()> + Send + Sync>;

/// Handler slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Every response, whatever the status.
    All,
    /// 1xx.
    Informational,
    /// 2xx.
    Success,
    /// 3xx.
    Redirection,
    /// 4xx.
    ClientError,
    /// 5xx.
    ServerError,
    /// Responses no other slot handled.
    Default,
}

impl Slot {
    /// Every slot, in table order.
    pub const ALL: [Self; 7] = [
        Self::All,
        Self::Informational,
        Self::Success,
        Self::Redirection,
        Self::ClientError,
        Self::ServerError,
        Self::Default,
    ];

    /// Position in the handler table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::All => 0,
            Self::Informational => 1,
            Self::Success => 2,
            Self::Redirection => 3,
            Self::ClientError => 4,
            Self::ServerError => 5,
            Self::Default => 6,
        }
    }

    /// Slot of a status class, `None` outside 100..=599.
    #[must_use]
    pub const fn for_status(status: u16) -> Option<Self> {
        match status {
            100..=199 => Some(Self::Informational),
            200..=299 => Some(Self::Success),
            300..=399 => Some(Self::Redirection),
            400..=499 => Some(Self::ClientError),
            500..=599 => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// Handler table indexed by [`Slot`].
#[derive(Clone, Default)]
pub struct Handlers {
    slots: [Option<Handler>; 7],
}

impl Handlers {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in handlers: [`decode_response_body`] for 2xx
    /// and [`read_body_as_error`] as the default.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut handlers = Self::new();
        handlers.set(Slot::Success, Arc::new(decode_response_body));
        handlers.set(Slot::Default, Arc::new(read_body_as_error));
        handlers
    }

    /// Handler of a slot.
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&Handler> {
        self.slots.get(slot.index())?.as_ref()
    }

    /// Set the handler of a slot.
    pub fn set(&mut self, slot: Slot, handler: Handler) {
        if let Some(entry) = self.slots.get_mut(slot.index()) {
            *entry = Some(handler);
        }
    }

    /// Remove the handler of a slot.
    pub fn clear(&mut self, slot: Slot) {
        if let Some(entry) = self.slots.get_mut(slot.index()) {
            *entry = None;
        }
    }

    /// Returns `true` if no slot is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Select the handler for a status.
    #[must_use]
    pub fn select(&self, status: u16, ignore_404: bool) -> Option<(Slot, &Handler)> {
        let class = Slot::for_status(status)
            .filter(|slot| !(ignore_404 && status == 404 && *slot == Slot::ClientError));
        [Some(Slot::All), class, Some(Slot::Default)]
            .into_iter()
            .flatten()
            .find_map(|slot| self.get(slot).map(|handler| (slot, handler)))
    }

    /// Run the selected handler, if any.
    pub fn dispatch(
        &self,
        response: &RawResponse,
        ignore_404: bool,
        dst: Option<&mut dyn Destination>,
    ) -> Result<()> {
        match self.select(response.status(), ignore_404) {
            Some((_, handler)) => handler(dst, response),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = Slot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_some());
        f.debug_set().entries(set).finish()
    }
}

// ============================================================================
// Built-in Handlers
// ============================================================================

/// Decode the body into the destination.
///
/// Does nothing without destination, for a 204, or for an empty body.
pub fn decode_response_body(dst: Option<&mut dyn Destination>, response: &RawResponse) -> Result<()> {
    match dst {
        Some(dst) => response.decode_into(dst),
        None => Ok(()),
    }
}

/// Turn the response into an [`HttpError`], except for redirections.
pub fn read_body_as_error(_dst: Option<&mut dyn Destination>, response: &RawResponse) -> Result<()> {
    if response.is_redirection() {
        return Ok(());
    }
    Err(HttpError::from_response(response).into())
}
