//! Main slot pool implementation
//!
//! # Safety
//!
//! This module implements a fixed-capacity, type-specialized pool combining
//! two free-storage tiers:
//! - A per-thread unsynchronized cache (every `deallocate`, fast-path
//!   `allocate`), with no atomics involved
//! - A shared lock-free stack (fallback `allocate`), a single atomic head
//!   updated via compare-and-swap
//!
//! ## Invariants
//!
//! - Every slot is, at any instant, free on the shared stack, free in
//!   exactly one thread's cache, or handed out to a caller
//! - A slot never sits on two free lists at once
//! - Slot count and slot boundaries are fixed at construction
//! - The pool neither constructs nor drops objects in slots; it recycles raw
//!   storage and nothing else

use core::marker::PhantomData;
use core::ptr;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::config::PoolConfig;
use super::free_list::{FreeSlot, SharedStack};
use super::local_cache::{self, CacheKey};
use super::stats::PoolStats;
use crate::arena::Arena;
use crate::error::{MemoryError, Result};
use crate::utils::{atomic_max, cache_line_size, is_aligned};

/// Operation counters, recorded only when the configuration asks for them.
#[derive(Debug, Default)]
struct Counters {
    total_allocs: AtomicU64,
    total_deallocs: AtomicU64,
    cache_hits: AtomicU64,
    shared_pops: AtomicU64,
    failed_allocs: AtomicU64,
    in_use: AtomicUsize,
    peak_in_use: AtomicUsize,
}

/// Fixed-capacity, type-specialized memory pool.
///
/// Preallocates storage for `capacity` values of `T` in one contiguous,
/// cache-line-aligned arena and recycles it without touching the general
/// heap and without blocking any thread. `allocate` serves the calling
/// thread's cache first and falls back to a lock-free shared stack;
/// `deallocate` always returns the slot to the calling thread's cache.
///
/// The pool hands out *raw, uninitialized* storage. Callers construct values
/// in place and must destroy them before freeing; the pool never runs
/// constructors or destructors and performs no double-free or
/// use-after-free detection.
///
/// # Constraints on `T`
///
/// Slots are packed at a stride of exactly `size_of::<T>()` with no padding,
/// and free slots store an intrusive pointer-sized link in their first
/// bytes. Construction therefore rejects types whose size cannot hold the
/// link, whose size breaks pointer alignment of subsequent slots, or whose
/// alignment exceeds the cache line (only the arena base is cache-line
/// aligned). Callers wanting stronger per-slot alignment size `T`
/// accordingly.
///
/// # Thread caches outlive the pool
///
/// Freed slots live in caches keyed by `(T, capacity)` and tied to the
/// *thread*, not to this pool instance. Dropping a pool does not purge those
/// caches: creating another pool with the same element type and capacity on
/// a thread that still holds stale slots will recycle storage of the dead
/// pool. Callers who drop and recreate same-configuration pools must first
/// drain their caches (allocate until exhaustion) or key the pools apart.
///
/// Freed slots also never migrate back to the shared stack, so a thread that
/// never frees can observe exhaustion while other threads hold idle cached
/// capacity. This asymmetry is the price of the synchronization-free fast
/// path and is intentionally preserved.
///
/// # Example
///
/// ```
/// use slotpool::SlotPool;
///
/// let pool = SlotPool::<u64>::new(2).unwrap();
/// let slot = pool.allocate().expect("fresh pool has free slots");
///
/// // SAFETY: slot is valid uninitialized storage for one u64, and it is
/// // written before being read or returned.
/// unsafe {
///     slot.as_ptr().write(42);
///     assert_eq!(slot.as_ptr().read(), 42);
///     pool.deallocate(slot);
/// }
/// ```
#[derive(Debug)]
pub struct SlotPool<T: 'static> {
    /// Backing storage; slot boundaries are immutable after construction
    arena: Arena,

    /// Shared fallback tier, populated once at construction
    shared: SharedStack,

    /// Identity under which threads cache this pool's freed slots
    cache_key: CacheKey,

    /// Configuration
    config: PoolConfig,

    /// Statistics (recorded only if config.track_stats)
    counters: Counters,

    /// The pool stores no `T` values, only raw storage for them
    _marker: PhantomData<fn(T) -> T>,
}

impl<T: 'static> SlotPool<T> {
    /// Creates a pool with `capacity` free slots and default configuration.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero, if `T` violates the slot
    /// constraints (see the type-level docs), or if backing memory cannot be
    /// obtained. The pool never exists partially initialized.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(capacity, PoolConfig::default())
    }

    /// Creates a pool with `capacity` free slots and a custom configuration.
    ///
    /// # Errors
    /// Same conditions as [`new`](Self::new).
    pub fn with_config(capacity: usize, config: PoolConfig) -> Result<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_size(0, "pool capacity must be non-zero"));
        }

        let slot_size = size_of::<T>();
        let link_size = size_of::<*mut FreeSlot>();

        if slot_size < link_size {
            return Err(MemoryError::invalid_size(
                slot_size,
                "element too small to hold the free-list link",
            ));
        }

        if !is_aligned(slot_size, align_of::<*mut FreeSlot>()) {
            return Err(MemoryError::invalid_size(
                slot_size,
                "slot stride must keep every slot aligned for the free-list link",
            ));
        }

        if align_of::<T>() > cache_line_size() {
            return Err(MemoryError::invalid_alignment(align_of::<T>(), cache_line_size()));
        }

        let arena = Arena::new(slot_size, capacity)?;

        if let Some(pattern) = config.alloc_pattern {
            arena.fill(pattern);
        }

        let shared = SharedStack::new();
        // SAFETY: the arena is fresh and unshared; slot size and alignment
        // were validated above to hold the intrusive link.
        unsafe { shared.seed(&arena) };

        #[cfg(feature = "logging")]
        tracing::debug!(
            capacity,
            slot_size,
            reserved_bytes = arena.reserved_bytes(),
            type_name = core::any::type_name::<T>(),
            "slot pool created"
        );

        Ok(Self {
            arena,
            shared,
            cache_key: CacheKey::new::<T>(capacity),
            config,
            counters: Counters::default(),
            _marker: PhantomData,
        })
    }

    /// Returns raw, uninitialized storage for one `T`, or `None` if both the
    /// calling thread's cache and the shared free list are empty.
    ///
    /// Exhaustion is a normal outcome, cheap to check: not an error, and no
    /// retry loop is built in. The call never blocks and never touches the
    /// general heap. The returned storage is *not* constructed: write a value
    /// before reading, and drop it in place before returning the slot via
    /// [`deallocate`](Self::deallocate).
    #[inline]
    pub fn allocate(&self) -> Option<NonNull<T>> {
        // Fast path: this thread's cache, no atomics.
        if let Some(slot) = local_cache::pop(self.cache_key) {
            if self.config.track_stats {
                self.record_alloc(true);
            }
            return Some(slot.cast::<T>());
        }

        // Slow path: shared lock-free stack.
        match self.shared.pop(self.config.use_backoff) {
            Some(slot) => {
                if self.config.track_stats {
                    self.record_alloc(false);
                }
                Some(slot.cast::<T>())
            }
            None => {
                if self.config.track_stats {
                    self.counters.failed_allocs.fetch_add(1, Ordering::Relaxed);
                }
                None
            }
        }
    }

    /// Returns a slot to the calling thread's cache.
    ///
    /// The slot becomes immediately reusable by this thread's next
    /// [`allocate`](Self::allocate) (LIFO); it is never pushed back onto the
    /// shared free list and is invisible to other threads.
    ///
    /// # Safety
    /// - `ptr` must have been returned by `allocate` on this pool and not yet
    ///   deallocated since
    /// - Any value constructed in the slot must already be dropped
    /// - The storage must not be used after this call until `allocate`
    ///   returns it again
    ///
    /// Violations (double free, foreign pointer, use after free) are
    /// undefined behavior; the pool performs no validation in release builds.
    #[inline]
    pub unsafe fn deallocate(&self, ptr: NonNull<T>) {
        let raw = ptr.as_ptr().cast::<u8>();
        debug_assert!(self.arena.contains(raw), "pointer does not belong to this pool");
        debug_assert!(
            self.arena.offset_of(raw) % self.arena.slot_size() == 0,
            "pointer is not a slot boundary"
        );

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: per the caller's contract the slot is exclusively ours
            // again and holds no live value.
            unsafe {
                ptr::write_bytes(raw, pattern, self.arena.slot_size());
            }
        }

        // SAFETY: the slot belongs to this pool's arena (caller contract) and
        // is free again; writing the link is validated at construction.
        unsafe {
            local_cache::push(self.cache_key, ptr.cast::<FreeSlot>());
        }

        if self.config.track_stats {
            self.counters.total_deallocs.fetch_add(1, Ordering::Relaxed);
            self.counters.in_use.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Total number of slots in the pool.
    pub fn capacity(&self) -> usize {
        self.arena.slot_count()
    }

    /// Stride of each slot in bytes (`size_of::<T>()`).
    pub fn slot_size(&self) -> usize {
        self.arena.slot_size()
    }

    /// Checks whether a pointer lands inside this pool's slot region.
    pub fn contains(&self, ptr: *const T) -> bool {
        self.arena.contains(ptr.cast())
    }

    /// Number of this pool's slots the calling thread currently has cached.
    pub fn cached_on_this_thread(&self) -> usize {
        local_cache::cached_len(self.cache_key)
    }

    /// Statistics snapshot, if tracking is enabled.
    pub fn stats(&self) -> Option<PoolStats> {
        if !self.config.track_stats {
            return None;
        }

        Some(PoolStats {
            total_allocs: self.counters.total_allocs.load(Ordering::Relaxed),
            total_deallocs: self.counters.total_deallocs.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            shared_pops: self.counters.shared_pops.load(Ordering::Relaxed),
            failed_allocs: self.counters.failed_allocs.load(Ordering::Relaxed),
            in_use: self.counters.in_use.load(Ordering::Relaxed),
            peak_in_use: self.counters.peak_in_use.load(Ordering::Relaxed),
            capacity: self.arena.slot_count(),
            slot_size: self.arena.slot_size(),
        })
    }

    fn record_alloc(&self, from_cache: bool) {
        self.counters.total_allocs.fetch_add(1, Ordering::Relaxed);
        if from_cache {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.shared_pops.fetch_add(1, Ordering::Relaxed);
        }
        let now_in_use = self.counters.in_use.fetch_add(1, Ordering::Relaxed) + 1;
        atomic_max(&self.counters.peak_in_use, now_in_use);
    }
}

impl<T: 'static> Drop for SlotPool<T> {
    fn drop(&mut self) {
        // The arena releases the backing region; outstanding live objects
        // are the caller's leak, and cached slots of this pool become stale
        // (see the type-level docs).
        #[cfg(feature = "logging")]
        tracing::trace!(
            capacity = self.arena.slot_count(),
            type_name = core::any::type_name::<T>(),
            "slot pool dropped"
        );
    }
}

// SAFETY: SlotPool<T> is Send when T is Send:
// - The arena is an owned allocation; transferring the pool transfers it
// - All shared mutation goes through the atomic free-list head
// - Thread caches are reached through thread-local state, never stored in
//   the pool itself
unsafe impl<T: Send + 'static> Send for SlotPool<T> {}

// SAFETY: SlotPool<T> is Sync when T is Send:
// - allocate/deallocate take &self and synchronize exclusively through the
//   CAS-updated shared head (AcqRel/Acquire) or thread-local state
// - Slot boundaries and configuration are immutable after construction
// - Counters are atomics with relaxed ordering (observation only)
unsafe impl<T: Send + 'static> Sync for SlotPool<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_capacity() {
        let err = SlotPool::<u64>::new(0).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidSize { size: 0, .. }));
    }

    #[test]
    fn test_rejects_undersized_element() {
        let err = SlotPool::<u8>::new(8).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidSize { size: 1, .. }));
    }

    #[test]
    fn test_rejects_link_misaligned_stride() {
        // 9-byte stride would leave slot 1 unaligned for the intrusive link.
        let err = SlotPool::<[u8; 9]>::new(8).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidSize { size: 9, .. }));
    }

    #[test]
    fn test_rejects_overaligned_element() {
        #[repr(align(256))]
        #[derive(Debug)]
        struct Huge(#[allow(dead_code)] [u8; 256]);

        let err = SlotPool::<Huge>::new(4).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidAlignment { value: 256, .. }));
    }

    #[test]
    fn test_allocate_within_arena() {
        let pool = SlotPool::<[u64; 4]>::new(8).unwrap();
        let slot = pool.allocate().unwrap();
        assert!(pool.contains(slot.as_ptr()));
        // SAFETY: slot came from this pool and holds no live value.
        unsafe { pool.deallocate(slot) };
    }

    #[test]
    fn test_stats_disabled_by_production_config() {
        let pool = SlotPool::<u64>::with_config(4, PoolConfig::production()).unwrap();
        assert!(pool.stats().is_none());
    }

    #[test]
    fn test_stats_track_both_tiers() {
        struct Tracked(#[allow(dead_code)] u64);

        let pool = SlotPool::<Tracked>::with_config(4, PoolConfig::debug()).unwrap();

        let first = pool.allocate().unwrap();
        let second = pool.allocate().unwrap();
        // SAFETY: slots came from this pool; no values were constructed.
        unsafe { pool.deallocate(second) };
        let third = pool.allocate().unwrap();

        let stats = pool.stats().unwrap();
        assert_eq!(stats.total_allocs, 3);
        assert_eq!(stats.shared_pops, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.total_deallocs, 1);
        assert_eq!(stats.in_use, 2);
        assert_eq!(stats.peak_in_use, 2);
        assert_eq!(stats.failed_allocs, 0);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.slot_size, size_of::<Tracked>());

        // SAFETY: both slots are live allocations from this pool.
        unsafe {
            pool.deallocate(first);
            pool.deallocate(third);
        }
    }

    #[test]
    fn test_failed_alloc_counted() {
        struct Exhausting(#[allow(dead_code)] u64);

        let pool = SlotPool::<Exhausting>::with_config(1, PoolConfig::debug()).unwrap();
        let only = pool.allocate().unwrap();
        assert!(pool.allocate().is_none());
        assert_eq!(pool.stats().unwrap().failed_allocs, 1);

        // SAFETY: the slot is a live allocation from this pool.
        unsafe { pool.deallocate(only) };
    }
}
