//! Per-thread slot caches, keyed by pool configuration
//!
//! The cache is the synchronization-free fast path: `deallocate` always
//! pushes here, and `allocate` looks here before touching the shared stack.
//!
//! A cache belongs to the operating thread, not to any pool instance. It is
//! keyed by `(element type, capacity)`, so every pool with the same
//! configuration shares one cache on a given thread, and the cache outlives
//! any individual pool. Two consequences follow and are deliberate:
//!
//! - Slots freed by thread A are visible only to thread A's future
//!   allocations; they never migrate back to the shared stack. A thread that
//!   never frees can observe exhaustion while other threads hold idle
//!   capacity. This asymmetry buys the uncontended fast path.
//! - Dropping a pool does not purge its slots from thread caches. Creating a
//!   new pool with the same element type and capacity while stale slots
//!   remain cached hands out dangling storage; see the safety contract on
//!   [`SlotPool`](crate::SlotPool).
//!
//! The first free on a given thread registers the cache entry in a small
//! thread-local table (one map insert); steady-state pushes and pops touch
//! no allocator and no atomics.

use core::any::TypeId;
use core::cell::RefCell;
use core::ptr;
use core::ptr::NonNull;

use hashbrown::HashMap;

use super::free_list::FreeSlot;

/// Identity of a pool configuration: caches are shared across every pool
/// instance with the same element type and capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    type_id: TypeId,
    capacity: usize,
}

impl CacheKey {
    pub(crate) fn new<T: 'static>(capacity: usize) -> Self {
        Self { type_id: TypeId::of::<T>(), capacity }
    }
}

/// Head of one thread's unsynchronized free-slot stack.
struct CacheEntry {
    head: *mut FreeSlot,
    len: usize,
}

thread_local! {
    static CACHES: RefCell<HashMap<CacheKey, CacheEntry>> = RefCell::new(HashMap::new());
}

/// Unlinks and returns the calling thread's most recently freed slot, if any.
pub(crate) fn pop(key: CacheKey) -> Option<NonNull<FreeSlot>> {
    CACHES.with(|caches| {
        let mut caches = caches.borrow_mut();
        let entry = caches.get_mut(&key)?;
        let head = NonNull::new(entry.head)?;

        // SAFETY: head was pushed by this thread and nothing else has touched
        // it since; its next link is valid (another cached slot or null).
        entry.head = unsafe { (*head.as_ptr()).next };
        entry.len -= 1;
        Some(head)
    })
}

/// Links a freed slot onto the calling thread's stack.
///
/// # Safety
/// `slot` must point to a free slot of the pool identified by `key`, owned
/// exclusively by the caller, with room for a `FreeSlot` link.
pub(crate) unsafe fn push(key: CacheKey, slot: NonNull<FreeSlot>) {
    CACHES.with(|caches| {
        let mut caches = caches.borrow_mut();
        let entry = caches.entry(key).or_insert(CacheEntry { head: ptr::null_mut(), len: 0 });

        // SAFETY: the caller owns the slot exclusively; writing the link
        // cannot race and the slot is large enough per the pool's
        // construction-time validation.
        unsafe {
            (*slot.as_ptr()).next = entry.head;
        }
        entry.head = slot.as_ptr();
        entry.len += 1;
    });
}

/// Number of slots the calling thread currently has cached under `key`.
pub(crate) fn cached_len(key: CacheKey) -> usize {
    CACHES.with(|caches| caches.borrow().get(&key).map_or(0, |entry| entry.len))
}
