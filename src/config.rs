use crate::pool::{PoolConfig, DEFAULT_MAX_IDLE, DEFAULT_MAX_POOL_SIZE, DEFAULT_THRESHOLD};
use clap::{ArgAction, Parser};

/// fluent - render throughput driver for the pooled render pipeline
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of render threads
    #[arg(short, long, default_value = "4")]
    pub threads: usize,

    /// Renders per thread
    #[arg(short, long, default_value = "10000")]
    pub iterations: usize,

    /// Catalog items listed on each page
    #[arg(long, default_value = "50")]
    pub items: usize,

    /// Enable buffer pooling
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub pool: bool,

    /// Size in bytes separating small and large pool tiers
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: usize,

    /// Largest buffer capacity kept in the pool, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_POOL_SIZE)]
    pub max_pool_size: usize,

    /// Truncate oversized buffers instead of discarding them
    #[arg(long, default_value = "false")]
    pub keep_oversized: bool,

    /// Idle buffers kept per tier
    #[arg(long, default_value_t = DEFAULT_MAX_IDLE)]
    pub max_idle: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse_args() -> Self {
        Config::parse()
    }

    /// Pool configuration derived from the flags
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            enabled: self.pool,
            threshold: self.threshold,
            max_pool_size: self.max_pool_size,
            discard_oversized: !self.keep_oversized,
            max_idle: self.max_idle,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 4,
            iterations: 10_000,
            items: 50,
            pool: true,
            threshold: DEFAULT_THRESHOLD,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            keep_oversized: false,
            max_idle: DEFAULT_MAX_IDLE,
            log_level: "info".to_string(),
        }
    }
}
