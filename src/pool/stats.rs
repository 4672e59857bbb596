//! Slot pool statistics

/// Statistics snapshot for a slot pool
///
/// Counters are recorded with relaxed atomics and only when the pool's
/// configuration enables tracking; values observed during concurrent
/// operation are exact in the absence of races.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    /// Total successful allocations
    pub total_allocs: u64,
    /// Total deallocations
    pub total_deallocs: u64,
    /// Allocations served from the calling thread's cache
    pub cache_hits: u64,
    /// Allocations served from the shared free list
    pub shared_pops: u64,
    /// Allocations that found both tiers empty
    pub failed_allocs: u64,
    /// Slots currently handed out
    pub in_use: usize,
    /// Peak number of slots handed out at once
    pub peak_in_use: usize,
    /// Total number of slots
    pub capacity: usize,
    /// Stride of each slot in bytes
    pub slot_size: usize,
}
