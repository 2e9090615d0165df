use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Default size (bytes) separating the small and large tiers.
pub const DEFAULT_THRESHOLD: usize = 4 * 1024;

/// Default maximum capacity (bytes) of a buffer kept in the pool.
pub const DEFAULT_MAX_POOL_SIZE: usize = 256 * 1024;

/// Default number of idle buffers each tier can hold.
pub const DEFAULT_MAX_IDLE: usize = 1024;

/// Snapshot of the pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Pooling on/off. When off, every acquire allocates.
    pub enabled: bool,

    /// Hints below this go to the small tier (default: 4KB)
    pub threshold: usize,

    /// Released buffers with a larger capacity are discarded or truncated (default: 256KB)
    pub max_pool_size: usize,

    /// Discard oversized buffers instead of truncating them (default: true)
    pub discard_oversized: bool,

    /// Idle buffers per tier (default: 1024). Fixed at pool construction.
    pub max_idle: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_THRESHOLD,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            discard_oversized: true,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}

impl PoolConfig {
    /// Config with pooling turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Live, mutable pool settings shared by every acquire/release.
///
/// Each knob is its own atomic, so readers never observe a torn value.
/// Changing several knobs is not atomic as a group; last write wins per field.
#[derive(Debug)]
pub struct PoolSettings {
    enabled: AtomicBool,
    threshold: AtomicUsize,
    max_pool_size: AtomicUsize,
    discard_oversized: AtomicBool,
}

const ORDER_LOAD: Ordering = Ordering::Acquire;
const ORDER_STORE: Ordering = Ordering::Release;

impl PoolSettings {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            threshold: AtomicUsize::new(config.threshold),
            max_pool_size: AtomicUsize::new(config.max_pool_size),
            discard_oversized: AtomicBool::new(config.discard_oversized),
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(ORDER_LOAD)
    }

    #[inline]
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, ORDER_STORE);
    }

    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold.load(ORDER_LOAD)
    }

    #[inline]
    pub fn set_threshold(&self, size: usize) {
        self.threshold.store(size, ORDER_STORE);
    }

    #[inline]
    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size.load(ORDER_LOAD)
    }

    #[inline]
    pub fn discard_oversized(&self) -> bool {
        self.discard_oversized.load(ORDER_LOAD)
    }

    /// Set the maximum pooled capacity and what happens to larger buffers.
    #[inline]
    pub fn set_max_pool_size(&self, size: usize, discard: bool) {
        self.max_pool_size.store(size, ORDER_STORE);
        self.discard_oversized.store(discard, ORDER_STORE);
    }

    /// Read every knob into a plain config value.
    pub fn snapshot(&self, max_idle: usize) -> PoolConfig {
        PoolConfig {
            enabled: self.enabled(),
            threshold: self.threshold(),
            max_pool_size: self.max_pool_size(),
            discard_oversized: self.discard_oversized(),
            max_idle,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}
