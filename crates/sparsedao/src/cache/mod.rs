//! Cache backend implementations.
//!
//! Concrete implementations of `sparsedao_core::cache::CacheServiceProvider`.
//!
//! # Feature Flags
//!
//! - the in-memory LRU cache is always available
//! - `redis`: Redis cache using the redis crate

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
