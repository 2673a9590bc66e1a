use std::{env, time::Duration};

use sparsedao_core::storage::LockType;
use thiserror::Error;

/// Default cap on rows returned by list reads.
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Default number of concurrent store operations.
pub const DEFAULT_WORKERS: usize = 16;

/// Default per-operation timeout in milliseconds.
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 30_000;

/// Errors raised when validating configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Worker count must be greater than zero")]
    InvalidWorkerCount,
    #[error("Operation timeout must be greater than zero")]
    InvalidTimeout,
    #[error("Maximum rows must be greater than zero")]
    InvalidMaxRows,
}

/// Engine-wide settings, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaoConfig {
    /// Cap applied to every list read.
    pub max_rows: usize,
    pub lock_type: LockType,
    /// Whether updates run the merge service before writing.
    pub merge_enabled: bool,
}

impl DaoConfig {
    /// Create and validate engine settings.
    pub fn new(
        max_rows: usize,
        lock_type: LockType,
        merge_enabled: bool,
    ) -> Result<Self, ConfigError> {
        if max_rows == 0 {
            return Err(ConfigError::InvalidMaxRows);
        }

        Ok(Self {
            max_rows,
            lock_type,
            merge_enabled,
        })
    }

    pub fn with_lock_type(mut self, lock_type: LockType) -> Self {
        self.lock_type = lock_type;
        self
    }

    pub fn with_merge_enabled(mut self, merge_enabled: bool) -> Self {
        self.merge_enabled = merge_enabled;
        self
    }
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            lock_type: LockType::Optimistic,
            merge_enabled: false,
        }
    }
}

/// Settings of the execution service (validated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Maximum store operations in flight.
    pub worker_count: usize,
    /// Timeout applied to each store operation, in milliseconds.
    pub operation_timeout_ms: u64,
}

impl ExecutorConfig {
    /// Create and validate executor settings.
    pub fn new(worker_count: usize, operation_timeout_ms: u64) -> Result<Self, ConfigError> {
        if worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if operation_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            worker_count,
            operation_timeout_ms,
        })
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKERS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub dao: DaoConfig,
    pub executor: ExecutorConfig,
    /// Cache TTL in seconds (default: 300)
    pub cache_ttl_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SPARSEDAO_MAX_ROWS` - Cap on list reads (default: 1000)
    /// - `SPARSEDAO_LOCK_TYPE` - `optimistic` or `pessimistic` (default: optimistic)
    /// - `SPARSEDAO_MERGE_ENABLED` - Run the merge service on updates (default: false)
    /// - `SPARSEDAO_WORKERS` - Concurrent store operations (default: 16)
    /// - `SPARSEDAO_OPERATION_TIMEOUT_MS` - Per-operation timeout (default: 30000)
    /// - `SPARSEDAO_CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 300)
    /// - `SPARSEDAO_CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    ///
    /// Unparseable or zero values fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            dao: DaoConfig {
                max_rows: positive_var("SPARSEDAO_MAX_ROWS").unwrap_or(DEFAULT_MAX_ROWS),
                lock_type: env::var("SPARSEDAO_LOCK_TYPE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
                merge_enabled: env::var("SPARSEDAO_MERGE_ENABLED")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(false),
            },
            executor: ExecutorConfig {
                worker_count: positive_var("SPARSEDAO_WORKERS").unwrap_or(DEFAULT_WORKERS),
                operation_timeout_ms: positive_var("SPARSEDAO_OPERATION_TIMEOUT_MS")
                    .unwrap_or(DEFAULT_OPERATION_TIMEOUT_MS),
            },
            cache_ttl_seconds: env::var("SPARSEDAO_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            cache_max_entries: positive_var("SPARSEDAO_CACHE_MAX_ENTRIES").unwrap_or(10_000),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        }
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn positive_var<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|v| *v > T::default())
}
