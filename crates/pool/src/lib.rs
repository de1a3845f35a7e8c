//! # paged-pool
//!
//! Fixed-size block pool allocator.
//!
//! A [`BlockPool<T>`] hands out equally-sized blocks for one element type and
//! takes them back, amortizing the system allocator by requesting memory a
//! whole page at a time:
//! - O(1) allocation and release through an intrusive LIFO free list
//! - unbounded growth, one page per exhaustion
//! - optional guard bands and release-time validation, chosen at the type
//!   level ([`Guarded`] / [`Unchecked`])
//!
//! ## Quick Start
//!
//! ```rust
//! use paged_pool::prelude::*;
//!
//! # fn main() -> paged_pool::PoolResult<()> {
//! let mut pool = BlockPool::<u64, Guarded>::new(64)?;
//!
//! let block = pool.allocate_block()?;
//! unsafe {
//!     block.write(42);
//!     assert_eq!(block.read(), 42);
//!     pool.free(block)?;
//! }
//!
//! // freeing twice is caught by the guarded layout
//! let err = unsafe { pool.free(block) }.unwrap_err();
//! assert!(matches!(err, MemoryError::DoubleFree { .. }));
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `logging` (default): lifecycle events through `tracing`
//! - `validation`: makes [`DefaultLayout`] the guarded layout
//!
//! ## Threading
//!
//! Pools are single-owner: every operation takes `&mut self`. A pool is
//! `Send`, so it can be moved to another thread or shared behind a mutex,
//! but it does no locking of its own.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms)]
// Raw page memory is the point of this crate
#![allow(unsafe_code)]

// Error types
pub mod error;

// Core modules
pub mod allocator;
pub mod block;
pub mod config;
mod free_list;
pub mod geometry;
pub mod layout;
pub mod page;
pub mod stats;

pub use crate::allocator::BlockPool;
pub use crate::block::Block;
pub use crate::config::PoolConfig;
pub use crate::error::{GuardSide, MemoryError, PoolResult, Result};
pub use crate::layout::{DefaultLayout, Guarded, PageLayout, Unchecked};
pub use crate::stats::PoolStats;

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::allocator::BlockPool;
    pub use crate::block::Block;
    pub use crate::config::PoolConfig;
    pub use crate::error::{GuardSide, MemoryError, PoolResult};
    pub use crate::layout::{DefaultLayout, Guarded, PageLayout, Unchecked};
    pub use crate::stats::PoolStats;
}
