use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::VariantStore;

/// Process-wide handle on a variant store. Every access, read or write, goes through a single mutex.
///
/// Clones share the same underlying store.
#[derive(Debug, Default)]
pub struct SharedStore<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: VariantStore> SharedStore<S> {
    pub fn new(store: S) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    /// Acquire the store. Keep the guard alive for as short as possible.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }

    /// Run `f` with the store locked, and release it right after.
    pub fn read<R, F: FnOnce(&S) -> R>(&self, f: F) -> R {
        f(&self.inner.lock())
    }

    pub fn write<R, F: FnOnce(&mut S) -> R>(&self, f: F) -> R {
        f(&mut self.inner.lock())
    }

    /// Retrieve the store back, if this is the last remaining handle.
    pub fn into_inner(self) -> Result<S, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
