//! Error types for pool construction and the RAII layer

use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = core::result::Result<T, MemoryError>;

/// Memory pool errors
///
/// Construction errors are hard failures: a pool never exists in a
/// partially-initialized state. Exhaustion of [`SlotPool::allocate`] is a
/// normal outcome reported as `None`, not through this type; the
/// [`PoolExhausted`](MemoryError::PoolExhausted) variant is produced only by
/// the [`PoolBox`](crate::PoolBox) layer.
///
/// [`SlotPool::allocate`]: crate::SlotPool::allocate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Backing storage could not be reserved from the system allocator
    #[error("out of memory: failed to reserve {requested} bytes of backing storage")]
    OutOfMemory {
        /// Bytes requested for the arena
        requested: usize,
    },

    /// A size parameter is unusable for this pool configuration
    #[error("invalid size {size}: {reason}")]
    InvalidSize {
        /// The offending size in bytes
        size: usize,
        /// Why the size was rejected
        reason: String,
    },

    /// An alignment requirement exceeds what the pool can honor
    #[error("invalid alignment {value}: exceeds supported limit {limit}")]
    InvalidAlignment {
        /// The requested alignment
        value: usize,
        /// The maximum alignment the pool guarantees
        limit: usize,
    },

    /// No free slot was available for an RAII allocation
    #[error("pool exhausted (capacity: {capacity})")]
    PoolExhausted {
        /// Total slot count of the pool
        capacity: usize,
    },
}

impl MemoryError {
    /// Create an out of memory error
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Create an invalid size error
    pub fn invalid_size(size: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSize { size, reason: reason.into() }
    }

    /// Create an invalid alignment error
    pub fn invalid_alignment(value: usize, limit: usize) -> Self {
        Self::InvalidAlignment { value, limit }
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(capacity: usize) -> Self {
        Self::PoolExhausted { capacity }
    }
}
