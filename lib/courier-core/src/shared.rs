//! Copy-on-write configuration values.

use std::ops::Deref;
use std::sync::Arc;

/// A configuration value shared between a client and the requests built
/// from it.
///
/// The `owned` flag tells whether this holder already made its private copy.
/// The first mutation through an inherited value clones it, later mutations
/// go through [`Arc::make_mut`] and never write through an allocation that
/// another holder can see.
#[derive(Debug)]
pub struct Shared<T> {
    value: Arc<T>,
    owned: bool,
}

impl<T> Shared<T> {
    /// Wrap a value owned by this holder.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            owned: true,
        }
    }

    /// Alias this value in a new holder, without copying it.
    #[must_use]
    pub fn inherit(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            owned: false,
        }
    }

    /// Borrow the value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Returns `true` once this holder has its private copy.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.owned
    }

    /// Returns `true` if both holders point to the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Replace the value with a freshly owned one.
    pub fn replace(&mut self, value: T) {
        self.value = Arc::new(value);
        self.owned = true;
    }
}

impl<T: Clone> Shared<T> {
    /// Mutable access, cloning the inherited value first if needed.
    pub fn to_mut(&mut self) -> &mut T {
        if !self.owned {
            self.value = Arc::new(T::clone(&self.value));
            self.owned = true;
        }
        Arc::make_mut(&mut self.value)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        self.inherit()
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
