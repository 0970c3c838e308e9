use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use parking_lot::Mutex;

/// Types that can be recycled through a [`SamplePool`].
pub trait Reuse {
    /// Prepare this value for reuse.
    ///
    /// Clears the contents and optionally shrinks capacity to `trim` to
    /// prevent unbounded growth. Returns `false` if the value retained no
    /// capacity and should be dropped instead of pooled.
    fn reuse(&mut self, trim: usize) -> bool;
}

impl<T> Reuse for Vec<T> {
    fn reuse(&mut self, trim: usize) -> bool {
        self.clear();
        self.shrink_to(trim);
        self.capacity() > 0
    }
}

struct PoolInner<T> {
    free: Mutex<Vec<T>>,
    max_idle: usize,
    trim_capacity: usize,
}

impl<T: Reuse> PoolInner<T> {
    fn put(&self, mut value: T) {
        if !value.reuse(self.trim_capacity) {
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(value);
        }
        // Pool full: drop the value.
    }
}

/// Shared pool of reusable sample buffers.
///
/// Cloning shares the same pool. The pool keeps at most `max_idle` free
/// buffers and trims each returned buffer's capacity to `trim_capacity`.
pub struct SamplePool<T: Reuse>(Arc<PoolInner<T>>);

impl<T: Reuse> Clone for SamplePool<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Reuse + Default> SamplePool<T> {
    /// Create a pool holding at most `max_idle` free buffers, trimming
    /// each to `trim_capacity` on return.
    #[must_use]
    pub fn new(max_idle: usize, trim_capacity: usize) -> Self {
        Self(Arc::new(PoolInner {
            free: Mutex::new(Vec::with_capacity(max_idle.min(16))),
            max_idle,
            trim_capacity,
        }))
    }

    /// Get a buffer, reusing a pooled one when available.
    #[must_use]
    pub fn get(&self) -> PooledBuf<T> {
        self.get_with(|_| {})
    }

    /// Get a buffer and initialize it before handing it out.
    pub fn get_with<F>(&self, init: F) -> PooledBuf<T>
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.0.free.lock().pop().unwrap_or_default();
        init(&mut value);
        PooledBuf {
            value: Some(value),
            pool: Arc::clone(&self.0),
        }
    }
}

impl<T: Reuse> SamplePool<T> {
    /// Return a bare value to the pool for reuse.
    ///
    /// For values that were extracted via [`PooledBuf::into_inner`] and
    /// have finished their trip through the pipeline.
    pub fn recycle(&self, value: T) {
        self.0.put(value);
    }

    /// Wrap an externally-created value so it returns to this pool on drop.
    #[must_use]
    pub fn attach(&self, value: T) -> PooledBuf<T> {
        PooledBuf {
            value: Some(value),
            pool: Arc::clone(&self.0),
        }
    }

    /// Number of free buffers currently held.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.0.free.lock().len()
    }
}

/// RAII guard for a pooled buffer; returns it to the pool on drop.
pub struct PooledBuf<T: Reuse> {
    value: Option<T>,
    pool: Arc<PoolInner<T>>,
}

impl<T: Reuse> PooledBuf<T> {
    /// Extract the value without returning it to the pool.
    ///
    /// # Panics
    ///
    /// Panics if the value was already taken (cannot happen through the
    /// public API).
    pub fn into_inner(mut self) -> T {
        self.value.take().expect("pooled value already taken")
    }
}

impl<T: Reuse> Drop for PooledBuf<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.put(value);
        }
    }
}

impl<T: Reuse> Deref for PooledBuf<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("pooled value already taken")
    }
}

impl<T: Reuse> DerefMut for PooledBuf<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("pooled value already taken")
    }
}

impl<T: Reuse + fmt::Debug> fmt::Debug for PooledBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => fmt::Debug::fmt(v, f),
            None => write!(f, "<taken>"),
        }
    }
}
