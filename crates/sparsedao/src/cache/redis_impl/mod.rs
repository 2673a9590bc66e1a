//! Redis cache backend implementation.
//!
//! Provides a distributed cache using Redis for multi-instance deployments.
//! Supports connection pooling, TTL and prefix-scoped clearing.

mod cache;
mod error;

pub use cache::RedisCache;
