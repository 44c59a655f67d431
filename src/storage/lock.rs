//! The write lock serializing job execution and cleanup cycles.
//!
//! The mutex owns the store outright, so holding the guard is the only way
//! to mutate it. One lock spans all tables: a cleanup cycle holds it for its
//! full duration, which bounds worst-case insert latency by one cycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared exclusive access to the store.
pub struct WriteLock<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for WriteLock<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> WriteLock<S> {
    /// Wrap `store` in a new lock.
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Block until the lock is free and take it.
    ///
    /// A panic in another holder does not invalidate the store: SQLite rolls
    /// back any half-applied statement, so a poisoned lock is recovered.
    pub fn acquire(&self) -> MutexGuard<'_, S> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.acquire();
        f(&mut guard)
    }
}
