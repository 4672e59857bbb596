//! Pool configuration

/// Configuration for a slot pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern written over the arena at construction (debugging aid)
    pub alloc_pattern: Option<u8>,

    /// Fill pattern written over a slot on deallocation (debugging aid)
    pub dealloc_pattern: Option<u8>,

    /// Use exponential backoff for CAS retries on the shared free list
    pub use_backoff: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) { Some(0xCC) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
            use_backoff: true,
        }
    }
}

impl PoolConfig {
    /// Production configuration - optimized for performance
    pub fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            use_backoff: true,
        }
    }

    /// Debug configuration - optimized for debugging
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
            use_backoff: false,
        }
    }

    /// Performance configuration - minimal overhead, no backoff spinning
    pub fn performance() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            use_backoff: false,
        }
    }
}
