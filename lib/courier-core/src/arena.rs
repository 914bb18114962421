//! Pool of reusable byte buffers.
//!
//! Request bodies are staged, response bodies drained and error snippets
//! captured in buffers taken from an [`Arena`]. A [`PooledBuf`] hands its
//! buffer back when dropped, whatever the exit path.

use std::ops::{Deref, DerefMut};
use std::sync::{LazyLock, Mutex, PoisonError};

use bytes::{Bytes, BytesMut};

/// Initial capacity of a freshly allocated buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Number of idle buffers kept by the pool.
pub const DEFAULT_MAX_POOLED: usize = 64;

/// Buffers that grew beyond this capacity are dropped instead of pooled.
pub const DEFAULT_MAX_RETAINED: usize = 256 * 1024;

static GLOBAL: LazyLock<Arena> = LazyLock::new(Arena::default);

/// Bounded, thread-safe pool of [`BytesMut`] buffers.
#[derive(Debug)]
pub struct Arena {
    free: Mutex<Vec<BytesMut>>,
    buffer_capacity: usize,
    max_pooled: usize,
    max_retained: usize,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(
            DEFAULT_BUFFER_CAPACITY,
            DEFAULT_MAX_POOLED,
            DEFAULT_MAX_RETAINED,
        )
    }
}

impl Arena {
    /// Create a pool.
    ///
    /// `buffer_capacity` is the size of new buffers, `max_pooled` the number
    /// of idle buffers kept, and `max_retained` the largest capacity a buffer
    /// may have to be pooled again.
    #[must_use]
    pub fn new(buffer_capacity: usize, max_pooled: usize, max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_pooled)),
            buffer_capacity,
            max_pooled,
            max_retained: max_retained.max(buffer_capacity),
        }
    }

    /// Process-wide pool.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Take a cleared buffer from the pool, allocating when it is empty.
    #[must_use]
    pub fn acquire(&self) -> PooledBuf<'_> {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_capacity));
        PooledBuf { arena: self, buf }
    }

    /// Number of idle buffers.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, mut buf: BytesMut) {
        if buf.capacity() == 0 || buf.capacity() > self.max_retained {
            return;
        }
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_pooled {
            free.push(buf);
        }
    }
}

/// Buffer borrowed from an [`Arena`], returned on drop.
#[derive(Debug)]
pub struct PooledBuf<'a> {
    arena: &'a Arena,
    buf: BytesMut,
}

impl PooledBuf<'_> {
    /// Copy the current content out, leaving the buffer to the pool.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }
}

impl Deref for PooledBuf<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuf<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuf<'_> {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.arena.release(buf);
    }
}
