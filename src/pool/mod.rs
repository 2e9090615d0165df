//! Memory pooling for render buffers.
//!
//! A two-tier, lock-free pool of `BytesMut` buffers with live,
//! atomically-updated configuration. Renders acquire through
//! [`crate::render`], never from here directly.

mod buffer;
mod config;

pub use buffer::{buffer_pool, BufferPool, PoolStats, PooledBuffer, Tier};
pub use config::{
    PoolConfig, PoolSettings, DEFAULT_MAX_IDLE, DEFAULT_MAX_POOL_SIZE, DEFAULT_THRESHOLD,
};
