//! Smart pointer for pool-allocated values

use core::ops::{Deref, DerefMut};
use core::ptr;
use core::ptr::NonNull;

use super::allocator::SlotPool;
use crate::error::{MemoryError, Result};

/// RAII smart pointer for a value constructed in a pool slot.
///
/// Layers object lifetime management on top of the raw
/// [`allocate`](SlotPool::allocate)/[`deallocate`](SlotPool::deallocate)
/// contract: `new_in` constructs the value in place, and `Drop` runs the
/// destructor before returning the slot to the calling thread's cache.
/// Similar to `Box`, but backed by a fixed-capacity pool.
#[derive(Debug)]
pub struct PoolBox<'a, T: 'static> {
    ptr: NonNull<T>,
    pool: &'a SlotPool<T>,
}

impl<'a, T: 'static> PoolBox<'a, T> {
    /// Constructs `value` in a slot allocated from `pool`.
    ///
    /// # Errors
    /// Returns [`MemoryError::PoolExhausted`] when both the calling thread's
    /// cache and the shared free list are empty; `value` is dropped in that
    /// case.
    pub fn new_in(value: T, pool: &'a SlotPool<T>) -> Result<Self> {
        let Some(ptr) = pool.allocate() else {
            return Err(MemoryError::pool_exhausted(pool.capacity()));
        };

        // SAFETY: ptr is valid, properly aligned, uninitialized storage for
        // one T, exclusively ours until Drop runs.
        unsafe {
            ptr.as_ptr().write(value);
        }

        Ok(Self { ptr, pool })
    }

    /// Consumes the `PoolBox` and returns the contained value.
    ///
    /// The slot goes back to the calling thread's cache without running the
    /// destructor (ownership of the value moves to the caller).
    #[must_use]
    pub fn into_inner(self) -> T {
        // SAFETY: self.ptr holds an initialized T; ptr::read moves it out
        // without dropping, and mem::forget below prevents Drop from running
        // the destructor or freeing twice.
        let value = unsafe { ptr::read(self.ptr.as_ptr()) };

        // SAFETY: the slot came from this pool and its value was just moved
        // out, so the storage is dead and may be recycled.
        unsafe {
            self.pool.deallocate(self.ptr);
        }

        core::mem::forget(self);
        value
    }
}

impl<T: 'static> Deref for PoolBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: ptr points to an initialized T for the lifetime of self;
        // shared access is tied to &self.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: 'static> DerefMut for PoolBox<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: ptr points to an initialized T; &mut self guarantees
        // exclusive access.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: 'static> Drop for PoolBox<'_, T> {
    fn drop(&mut self) {
        // SAFETY: ptr holds an initialized T owned by this box. The value is
        // destroyed first, then the dead slot is returned to the cache of
        // whichever thread drops the box.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            self.pool.deallocate(self.ptr);
        }
    }
}

// SAFETY: PoolBox owns a T by value (constructed in pool storage), so it may
// move between threads when T can; dropping on another thread frees into
// that thread's cache, which the pool's tiering explicitly allows. The pool
// reference itself is Sync for T: Send.
unsafe impl<T: Send + 'static> Send for PoolBox<'_, T> {}
