//! Fixed-capacity lock-free memory pools for latency-critical paths
//!
//! This crate provides a type-specialized slot pool for code that cannot
//! afford general-purpose allocation: order-object recycling in trading
//! systems and similar hot paths. Storage for a bounded number of same-sized
//! objects is reserved once, up front; afterwards allocation and
//! deallocation never touch the general heap and never block.
//!
//! Free storage is managed in two tiers:
//!
//! - A **per-thread cache**: every free goes here, and allocations are
//!   served from here first, with no synchronization at all
//! - A **shared lock-free stack** (Treiber stack with an atomic head) as the
//!   fallback when the calling thread's cache is empty
//!
//! The pool recycles *raw storage only*. Callers construct objects in place
//! and destroy them before freeing; exhaustion is reported as `None`, never
//! by blocking or by an error. See [`SlotPool`] for the full contract,
//! including the deliberate asymmetry that freed slots stay with the freeing
//! thread.
//!
//! # Example
//!
//! ```
//! use slotpool::{PoolBox, SlotPool};
//!
//! struct Order {
//!     id: u64,
//!     price: f64,
//!     qty: u32,
//! }
//!
//! # fn main() -> slotpool::Result<()> {
//! let pool = SlotPool::<Order>::new(4)?;
//!
//! let order = PoolBox::new_in(Order { id: 1, price: 100.5, qty: 10 }, &pool)?;
//! assert_eq!(order.id, 1);
//!
//! // Dropping the box destroys the order and recycles its slot into this
//! // thread's cache for the next allocation.
//! drop(order);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `logging` (default): construction/teardown events via `tracing`

#![warn(missing_docs)]

mod arena;
pub mod error;
pub mod pool;
pub mod utils;

pub use error::{MemoryError, Result};
pub use pool::{PoolBox, PoolConfig, PoolStats, SlotPool};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
