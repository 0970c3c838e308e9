//! Reusable sample-buffer pool for allocation-free steady-state output.
//!
//! A downstream sink owns one pool per sample type and serves the
//! filter's per-buffer output allocations from it. Buffers return to the
//! pool automatically on drop.
//!
//! ## Example
//!
//! ```
//! use varispeed_bufpool::SamplePool;
//!
//! let pool: SamplePool<Vec<i16>> = SamplePool::new(16, 64 * 1024);
//! let mut buf = pool.get_with(|b| b.resize(1024, 0));
//! assert_eq!(buf.len(), 1024);
//! // Returned to the pool when `buf` drops.
//! ```

#![forbid(unsafe_code)]

mod pool;

pub use pool::{PooledBuf, Reuse, SamplePool};
