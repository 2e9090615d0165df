//! Tiered, lock-free pool of reusable BytesMut buffers.
//!
//! Acquire routes by the caller's size hint, release routes by the
//! buffer's actual capacity, so buffers that grew during a large render
//! settle in the large tier and stop leaking into small fragment renders.

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use tracing::{debug, trace};

use super::config::{PoolConfig, PoolSettings};

/// Global buffer pool shared by default renders.
static BUFFER_POOL_INNER: OnceLock<BufferPool> = OnceLock::new();

/// Get the global buffer pool.
pub fn buffer_pool() -> &'static BufferPool {
    BUFFER_POOL_INNER.get_or_init(BufferPool::new)
}

/// Which registry a buffer is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Small,
    Large,
}

/// Two-tier pool of reusable BytesMut buffers.
pub struct BufferPool {
    /// Live configuration, read on every acquire/release.
    settings: PoolSettings,
    /// Idle buffers with capacity below the threshold.
    small: ArrayQueue<BytesMut>,
    /// Idle buffers with capacity at or above the threshold.
    large: ArrayQueue<BytesMut>,
    /// Idle buffers per tier.
    max_idle: usize,
    /// Statistics: buffers acquired from pool.
    hits: AtomicUsize,
    /// Statistics: buffers created new (pool miss or pool disabled).
    misses: AtomicUsize,
    /// Statistics: buffers returned to pool.
    returns: AtomicUsize,
    /// Statistics: buffers dropped (tier full).
    drops: AtomicUsize,
    /// Statistics: oversized buffers discarded on release.
    discards: AtomicUsize,
}

impl BufferPool {
    /// Create a pool with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool from an explicit configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        let max_idle = config.max_idle.max(1);
        Self {
            settings: PoolSettings::new(&config),
            small: ArrayQueue::new(max_idle),
            large: ArrayQueue::new(max_idle),
            max_idle,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            returns: AtomicUsize::new(0),
            drops: AtomicUsize::new(0),
            discards: AtomicUsize::new(0),
        }
    }

    /// Tier an acquire with this hint draws from.
    #[inline]
    pub fn tier_for(&self, size: usize) -> Tier {
        if size < self.settings.threshold() {
            Tier::Small
        } else {
            Tier::Large
        }
    }

    #[inline]
    fn queue(&self, tier: Tier) -> &ArrayQueue<BytesMut> {
        match tier {
            Tier::Small => &self.small,
            Tier::Large => &self.large,
        }
    }

    /// Get an empty buffer with capacity of at least `size_hint`.
    ///
    /// A hint of 0 means "no preference". Never fails: a disabled pool or
    /// an empty tier falls back to a fresh allocation.
    #[inline]
    pub fn acquire(&self, size_hint: usize) -> BytesMut {
        if !self.settings.enabled() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return BytesMut::with_capacity(size_hint);
        }

        match self.queue(self.tier_for(size_hint)).pop() {
            Some(mut buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf.clear();
                // After clear() reserve(n) guarantees capacity >= n
                if buf.capacity() < size_hint {
                    buf.reserve(size_hint);
                }
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                BytesMut::with_capacity(size_hint)
            }
        }
    }

    /// Return a buffer to the pool.
    ///
    /// Routed by current capacity, not by the hint it was acquired with.
    /// Oversized buffers are discarded or truncated to `max_pool_size`.
    #[inline]
    pub fn release(&self, mut buf: BytesMut) {
        if !self.settings.enabled() {
            return;
        }

        let max = self.settings.max_pool_size();
        if buf.capacity() > max {
            if self.settings.discard_oversized() {
                self.discards.fetch_add(1, Ordering::Relaxed);
                trace!(capacity = buf.capacity(), max, "discarding oversized buffer");
                return;
            }
            trace!(capacity = buf.capacity(), max, "truncating oversized buffer");
            buf = BytesMut::with_capacity(max);
        }

        buf.clear();

        let tier = self.tier_for(buf.capacity());
        if self.queue(tier).push(buf).is_ok() {
            self.returns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Optional release: `None` is accepted and ignored.
    #[inline]
    pub fn release_opt(&self, buf: Option<BytesMut>) {
        if let Some(buf) = buf {
            self.release(buf);
        }
    }

    /// Acquire wrapped in a guard that releases on drop.
    pub fn guard(&self, size_hint: usize) -> PooledBuffer<'_> {
        PooledBuffer {
            pool: self,
            buf: Some(self.acquire(size_hint)),
        }
    }

    // === Configuration ===

    /// Turn pooling on for subsequent calls.
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Turn pooling off; acquires allocate and releases are ignored.
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Set whether pooling is on.
    pub fn set_enabled(&self, enabled: bool) {
        self.settings.set_enabled(enabled);
        debug!(enabled, "buffer pool toggled");
    }

    /// Whether pooling is on.
    pub fn enabled(&self) -> bool {
        self.settings.enabled()
    }

    /// Set the size threshold between the small and large tiers in bytes.
    pub fn set_threshold(&self, size: usize) {
        self.settings.set_threshold(size);
        debug!(threshold = size, "buffer pool threshold changed");
    }

    /// Size threshold between the small and large tiers in bytes.
    pub fn threshold(&self) -> usize {
        self.settings.threshold()
    }

    /// Set the maximum capacity kept in the pool.
    ///
    /// Larger buffers are dropped on release if `discard` is true, otherwise
    /// replaced by a buffer of exactly `size` capacity before being pooled.
    pub fn set_max_pool_size(&self, size: usize, discard: bool) {
        self.settings.set_max_pool_size(size, discard);
        debug!(max_pool_size = size, discard, "buffer pool max size changed");
    }

    /// Maximum buffer capacity kept in the pool in bytes.
    pub fn max_pool_size(&self) -> usize {
        self.settings.max_pool_size()
    }

    /// Whether oversized buffers are dropped rather than truncated.
    pub fn discard_oversized(&self) -> bool {
        self.settings.discard_oversized()
    }

    /// Current configuration as a plain value.
    pub fn config(&self) -> PoolConfig {
        self.settings.snapshot(self.max_idle)
    }

    // === Introspection ===

    /// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            small: self.small.len(),
            large: self.large.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
        }
    }

    /// Idle buffers in the small tier.
    #[inline]
    pub fn small_len(&self) -> usize {
        self.small.len()
    }

    /// Idle buffers in the large tier.
    #[inline]
    pub fn large_len(&self) -> usize {
        self.large.len()
    }

    /// Get the current number of idle buffers across both tiers.
    #[inline]
    pub fn len(&self) -> usize {
        self.small.len() + self.large.len()
    }

    /// Check if the pool is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.small.is_empty() && self.large.is_empty()
    }

    /// Drop every idle buffer.
    pub fn clear(&self) {
        while self.small.pop().is_some() {}
        while self.large.pop().is_some() {}
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.config())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    /// Idle buffers in the small tier.
    pub small: usize,
    /// Idle buffers in the large tier.
    pub large: usize,
    /// Buffers acquired from pool (cache hits).
    pub hits: usize,
    /// Buffers created new (cache misses).
    pub misses: usize,
    /// Buffers returned to pool.
    pub returns: usize,
    /// Buffers dropped when a tier was full.
    pub drops: usize,
    /// Oversized buffers discarded on release.
    pub discards: usize,
}

impl PoolStats {
    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Idle buffers across both tiers.
    pub fn size(&self) -> usize {
        self.small + self.large
    }
}

/// RAII guard that returns buffer to pool on drop.
///
/// The buffer is present from construction until `take()` or drop.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<BytesMut>,
}

impl PooledBuffer<'_> {
    /// Take the buffer, preventing return to pool.
    pub fn take(mut self) -> BytesMut {
        self.buf.take().unwrap_or_default()
    }
}

impl std::ops::Deref for PooledBuffer<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &Self::Target {
        self.buf.as_ref().expect("pooled buffer present until drop")
    }
}

impl std::ops::DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buf.as_mut().expect("pooled buffer present until drop")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release_opt(self.buf.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> PoolConfig {
        PoolConfig {
            threshold: 64,
            max_pool_size: 1024,
            ..Default::default()
        }
    }

    #[test]
    fn test_pool_acquire_release() {
        let pool = BufferPool::new();

        let buf1 = pool.acquire(100);
        assert!(buf1.capacity() >= 100);

        let stats = pool.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);

        pool.release(buf1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.small_len(), 1);

        let buf2 = pool.acquire(100);
        assert!(buf2.capacity() >= 100);

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_clears_buffer() {
        let pool = BufferPool::new();

        let mut buf = pool.acquire(16);
        buf.extend_from_slice(b"hello world");
        assert!(!buf.is_empty());

        pool.release(buf);

        let buf2 = pool.acquire(16);
        assert!(buf2.is_empty());
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn test_acquire_grows_reused_buffer() {
        let pool = BufferPool::with_config(small_config());

        pool.release(BytesMut::with_capacity(8));
        assert_eq!(pool.small_len(), 1);

        let buf = pool.acquire(40);
        assert_eq!(pool.stats().hits, 1);
        assert!(buf.capacity() >= 40);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_zero_hint() {
        let pool = BufferPool::new();
        let buf = pool.acquire(0);
        assert!(buf.is_empty());
        assert_eq!(pool.tier_for(0), Tier::Small);
    }

    #[test]
    fn test_threshold_routing_by_capacity() {
        let pool = BufferPool::with_config(small_config());
        let t = pool.threshold();

        let mut buf = pool.acquire(t - 1);
        assert_eq!(pool.tier_for(t - 1), Tier::Small);
        buf.extend_from_slice(&vec![b'x'; t + 10]);
        assert!(buf.capacity() >= t);

        pool.release(buf);
        assert_eq!(pool.small_len(), 0);
        assert_eq!(pool.large_len(), 1);

        let buf = pool.acquire(t + 1);
        assert_eq!(pool.stats().hits, 1);
        assert!(buf.capacity() >= t + 1);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_small_hint_misses_large_tier() {
        let pool = BufferPool::with_config(small_config());
        pool.release(BytesMut::with_capacity(512));
        assert_eq!(pool.large_len(), 1);

        let _buf = pool.acquire(8);
        let stats = pool.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(pool.large_len(), 1);
    }

    #[test]
    fn test_discard_oversized() {
        let pool = BufferPool::with_config(small_config());
        let before = pool.len();

        pool.release(BytesMut::with_capacity(pool.max_pool_size() + 1));

        assert_eq!(pool.len(), before);
        assert_eq!(pool.stats().discards, 1);
        assert_eq!(pool.stats().returns, 0);
    }

    #[test]
    fn test_truncate_oversized() {
        let pool = BufferPool::with_config(small_config());
        pool.set_max_pool_size(1024, false);

        pool.release(BytesMut::with_capacity(8 * 1024));
        assert_eq!(pool.large_len(), 1);
        assert_eq!(pool.stats().discards, 0);

        let buf = pool.acquire(100);
        assert_eq!(pool.stats().hits, 1);
        assert!(buf.capacity() >= 100);
        assert!(buf.capacity() < 8 * 1024);
    }

    #[test]
    fn test_disabled_pool_never_reuses() {
        let pool = BufferPool::with_config(PoolConfig::disabled());

        let mut buf = pool.acquire(32);
        assert!(buf.capacity() >= 32);
        buf.extend_from_slice(b"secret");
        pool.release(buf);

        assert!(pool.is_empty());
        let buf = pool.acquire(32);
        assert!(buf.is_empty());

        let stats = pool.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.returns, 0);
    }

    #[test]
    fn test_toggle_does_not_touch_idle_buffers() {
        let pool = BufferPool::new();
        pool.release(BytesMut::with_capacity(16));
        pool.disable();
        assert_eq!(pool.len(), 1);

        let _fresh = pool.acquire(16);
        assert_eq!(pool.len(), 1);

        pool.enable();
        let _reused = pool.acquire(16);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_full_tier_drops() {
        let pool = BufferPool::with_config(PoolConfig {
            max_idle: 2,
            ..Default::default()
        });

        for _ in 0..3 {
            pool.release(BytesMut::with_capacity(16));
        }

        let stats = pool.stats();
        assert_eq!(stats.returns, 2);
        assert_eq!(stats.drops, 1);
        assert_eq!(stats.size(), 2);
    }

    #[test]
    fn test_config_readback() {
        let pool = BufferPool::new();
        pool.set_threshold(100);
        pool.set_max_pool_size(2048, false);

        assert_eq!(pool.threshold(), 100);
        assert_eq!(pool.max_pool_size(), 2048);
        assert!(!pool.discard_oversized());
        assert_eq!(pool.config().max_idle, crate::pool::DEFAULT_MAX_IDLE);
    }

    #[test]
    fn test_pooled_buffer_raii() {
        let pool = BufferPool::new();

        {
            let mut buf = pool.guard(128);
            buf.extend_from_slice(b"test");
            assert_eq!(&buf[..], b"test");
        }
        assert_eq!(pool.len(), 1);

        let buf = pool.acquire(128);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_pooled_buffer_take() {
        let pool = BufferPool::new();
        let mut guard = pool.guard(16);
        guard.extend_from_slice(b"keep");
        let buf = guard.take();

        assert_eq!(&buf[..], b"keep");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_none() {
        let pool = BufferPool::new();
        pool.release_opt(None);
        assert!(pool.is_empty());
        assert_eq!(pool.stats().returns, 0);
    }

    #[test]
    fn test_config_change_applies_to_in_flight_release() {
        let pool = BufferPool::new();

        let buf = pool.acquire(100);
        assert_eq!(pool.tier_for(100), Tier::Small);

        pool.set_threshold(64);
        pool.release(buf);
        assert_eq!(pool.small_len(), 0);
        assert_eq!(pool.large_len(), 1);

        let buf = pool.acquire(100);
        assert_eq!(pool.stats().hits, 1);

        pool.set_max_pool_size(50, true);
        pool.release(buf);
        assert!(pool.is_empty());
        assert_eq!(pool.stats().discards, 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = BufferPool::new();

        std::thread::scope(|s| {
            for id in 0..8u8 {
                let pool = &pool;
                s.spawn(move || {
                    for _ in 0..500 {
                        let mut buf = pool.acquire(64);
                        assert!(buf.is_empty());
                        buf.extend_from_slice(&[id; 64]);
                        assert!(buf.iter().all(|&b| b == id));
                        pool.release(buf);
                    }
                });
            }
        });

        let stats = pool.stats();
        assert_eq!(stats.hits + stats.misses, 8 * 500);
        assert!(pool.len() <= 8);
    }

    #[test]
    fn test_hit_rate() {
        let stats = PoolStats {
            hits: 75,
            misses: 25,
            returns: 70,
            drops: 5,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < 0.001);
        assert_eq!(PoolStats::default().hit_rate(), 0.0);
    }
}
