//! Request interceptors.
//!
//! A [`Hook`] receives the prepared request and returns it, possibly
//! modified. Hooks are grouped in a [`HookChain`] that runs them in
//! registration order and stops at the first failure.
//!
//! ```
//! use bytes::Bytes;
//! use courier_core::{Error, HookChain, Result};
//! use std::sync::Arc;
//!
//! let mut chain = HookChain::default();
//! chain.push(Arc::new(|mut req: http::Request<Bytes>| -> Result<_> {
//!     req.headers_mut().insert("x-trace", http::HeaderValue::from_static("1"));
//!     Ok(req)
//! }));
//! chain.push(Arc::new(|req: http::Request<Bytes>| -> Result<_> {
//!     if req.uri().path() == "/forbidden" {
//!         return Err(Error::hook("path is forbidden"));
//!     }
//!     Ok(req)
//! }));
//! assert_eq!(chain.len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::Result;

/// A request interceptor.
pub trait Hook: Send + Sync + 'static {
    /// Transform the outgoing request, or reject it.
    fn transform(&self, request: http::Request<Bytes>) -> Result<http::Request<Bytes>>;
}

impl<F> Hook for F
where
    F: Fn(http::Request<Bytes>) -> Result<http::Request<Bytes>> + Send + Sync + 'static,
{
    fn transform(&self, request: http::Request<Bytes>) -> Result<http::Request<Bytes>> {
        self(request)
    }
}

/// Ordered hooks.
#[derive(Clone, Default)]
pub enum HookChain {
    /// No hook.
    #[default]
    Empty,
    /// A single hook.
    Single(Arc<dyn Hook>),
    /// Two or more hooks, in registration order.
    Sequence(Vec<Arc<dyn Hook>>),
}

impl HookChain {
    /// Append a hook.
    ///
    /// `Empty` becomes `Single`, `Single` is promoted to a two-hook
    /// `Sequence`, and a `Sequence` grows in place.
    pub fn push(&mut self, hook: Arc<dyn Hook>) {
        match self {
            Self::Empty => *self = Self::Single(hook),
            Self::Single(first) => {
                let first = Arc::clone(first);
                *self = Self::Sequence(vec![first, hook]);
            }
            Self::Sequence(hooks) => hooks.push(hook),
        }
    }

    /// Hooks in registration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Arc<dyn Hook>] {
        match self {
            Self::Empty => &[],
            Self::Single(hook) => std::slice::from_ref(hook),
            Self::Sequence(hooks) => hooks,
        }
    }

    /// Number of hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if there is no hook.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Run every hook in order, stopping at the first error.
    pub fn transform(&self, request: http::Request<Bytes>) -> Result<http::Request<Bytes>> {
        self.as_slice()
            .iter()
            .try_fold(request, |request, hook| hook.transform(request))
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Single(_) => f.write_str("Single"),
            Self::Sequence(hooks) => write!(f, "Sequence({})", hooks.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::HeaderValue;

    use super::*;
    use crate::{Error, Shared};

    fn request() -> http::Request<Bytes> {
        http::Request::new(Bytes::new())
    }

    fn pass(req: http::Request<Bytes>) -> Result<http::Request<Bytes>> {
        Ok(req)
    }

    fn tag(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Hook> {
        Arc::new(move |req: http::Request<Bytes>| -> Result<_> {
            log.lock().expect("lock").push(name);
            Ok(req)
        })
    }

    #[test]
    fn push_promotes_variants() {
        let mut chain = HookChain::default();
        assert!(chain.is_empty());

        chain.push(Arc::new(pass));
        assert!(matches!(chain, HookChain::Single(_)));

        chain.push(Arc::new(pass));
        assert!(matches!(&chain, HookChain::Sequence(hooks) if hooks.len() == 2));

        chain.push(Arc::new(pass));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn hooks_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = HookChain::default();
        chain.push(tag("first", Arc::clone(&log)));
        chain.push(tag("second", Arc::clone(&log)));
        chain.push(tag("third", Arc::clone(&log)));

        chain.transform(request()).expect("chain");
        assert_eq!(*log.lock().expect("lock"), ["first", "second", "third"]);
    }

    #[test]
    fn first_error_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = HookChain::default();
        chain.push(tag("first", Arc::clone(&log)));
        chain.push(Arc::new(|_: http::Request<Bytes>| -> Result<_> {
            Err(Error::hook("denied"))
        }));
        chain.push(tag("third", Arc::clone(&log)));

        let err = chain.transform(request()).expect_err("should fail");
        assert!(err.is_hook());
        assert_eq!(err.to_string(), "hook error: denied");
        assert_eq!(*log.lock().expect("lock"), ["first"]);
    }

    #[test]
    fn hooks_can_modify_request() {
        let mut chain = HookChain::default();
        chain.push(Arc::new(|mut req: http::Request<Bytes>| -> Result<_> {
            req.headers_mut()
                .insert("x-hook", HeaderValue::from_static("on"));
            Ok(req)
        }));
        let req = chain.transform(request()).expect("chain");
        assert_eq!(req.headers().get("x-hook").map(HeaderValue::as_bytes), Some(&b"on"[..]));
    }

    #[test]
    fn push_on_inherited_sequence_leaves_parent_alone() {
        let mut parent = Shared::new(HookChain::default());
        parent.to_mut().push(Arc::new(pass));
        parent.to_mut().push(Arc::new(pass));

        let mut child = parent.inherit();
        child.to_mut().push(Arc::new(pass));

        assert_eq!(parent.len(), 2);
        assert_eq!(child.len(), 3);
        assert!(!parent.ptr_eq(&child));
    }
}
