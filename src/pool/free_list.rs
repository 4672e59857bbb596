//! Shared lock-free free list over preallocated slots
//!
//! # Safety
//!
//! This is a Treiber stack built directly over the arena's slot bytes:
//! - While a slot is free, its first `size_of::<*mut FreeSlot>()` bytes hold
//!   the intrusive `next` link; once popped, those bytes belong to the caller
//!   and are overwritten by whatever the caller constructs there
//! - The head pointer is the only shared mutable state and is updated
//!   exclusively through compare-and-swap
//! - Acquire on the head load pairs with the AcqRel/Release publications, so
//!   a thread that pops a slot observes the writes that established the
//!   slot's `next` link
//! - The classic ABA reordering hazard of CAS stacks applies; it is accepted
//!   because slots are recycled only within their own arena and never handed
//!   to a foreign allocator, so a reordered pop can only return a valid slot

use core::ptr;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicPtr, Ordering};

use crossbeam_utils::CachePadded;

use crate::arena::Arena;
use crate::utils::{Backoff, is_aligned};

/// Intrusive link written into a free slot's bytes.
///
/// Exists only while the slot sits on a free list; allocated slots carry
/// caller-managed storage instead.
#[repr(C)]
pub(crate) struct FreeSlot {
    pub(crate) next: *mut FreeSlot,
}

/// Multi-consumer lock-free stack of free slots.
///
/// Populated exactly once, when the pool links the fresh arena into a chain.
/// Steady-state `deallocate` never pushes here (freed slots go to the
/// calling thread's cache), so after construction the stack only drains.
#[derive(Debug)]
pub(crate) struct SharedStack {
    /// Head of the stack, isolated on its own cache line to keep CAS traffic
    /// away from the pool's other fields.
    head: CachePadded<AtomicPtr<FreeSlot>>,
}

impl SharedStack {
    /// Creates an empty stack.
    pub(crate) const fn new() -> Self {
        Self { head: CachePadded::new(AtomicPtr::new(ptr::null_mut())) }
    }

    /// Links every arena slot into the stack and publishes the head.
    ///
    /// Slots are chained in reverse index order so slot 0 ends up on top; no
    /// ordering is promised to callers.
    ///
    /// # Safety
    /// Must be called exactly once, before the owning pool is shared with any
    /// other thread, and every slot must be free (nothing handed out yet).
    /// Each slot must be large enough and sufficiently aligned to hold a
    /// `FreeSlot` link; the pool validates both at construction.
    pub(crate) unsafe fn seed(&self, arena: &Arena) {
        let mut chain: *mut FreeSlot = ptr::null_mut();

        for index in (0..arena.slot_count()).rev() {
            let slot = arena.slot_ptr(index).cast::<FreeSlot>();
            debug_assert!(is_aligned(slot as usize, align_of::<FreeSlot>()));

            // SAFETY: slot points into the arena, is link-aligned (checked by
            // the pool at construction), and no other thread can observe the
            // chain before the Release store below.
            unsafe {
                (*slot).next = chain;
            }
            chain = slot;
        }

        // Publish the fully-linked chain; pairs with the Acquire load in pop.
        self.head.store(chain, Ordering::Release);
    }

    /// Pops the top slot, or returns `None` if the stack is observed empty.
    ///
    /// An empty stack is pool exhaustion, a normal outcome, reported without
    /// retrying. A failed compare-and-swap (another thread won the race)
    /// retries against the freshly observed head, optionally spinning with
    /// exponential backoff between attempts. Never blocks.
    pub(crate) fn pop(&self, use_backoff: bool) -> Option<NonNull<FreeSlot>> {
        let mut backoff = if use_backoff { Some(Backoff::new()) } else { None };
        let mut head = self.head.load(Ordering::Acquire);

        loop {
            if head.is_null() {
                return None;
            }

            // SAFETY: head is non-null and was published either by seed or by
            // a previous successful CAS; the Acquire load above synchronizes
            // with that publication, so the next link is visible and valid.
            let next = unsafe { (*head).next };

            match self.head.compare_exchange_weak(head, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return NonNull::new(head),
                Err(current) => {
                    head = current;
                    if let Some(ref mut b) = backoff {
                        b.spin();
                    }
                }
            }
        }
    }
}
