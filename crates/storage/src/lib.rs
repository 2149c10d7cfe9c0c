//! Storage abstractions for wx services.
//!
//! Provides a key-value contract over three independent keyspaces:
//! - Location metadata (write-once, no expiry)
//! - METAR reports (TTL-bound)
//! - TAF reports (TTL-bound)
//!
//! `RedisStore` is the production backend; `MemoryStore` implements the same
//! contract in process for tests.

pub mod memory;
pub mod pool;
pub mod redis_store;
pub mod store;

pub use memory::MemoryStore;
pub use pool::{PoolConfig, PooledConnection, RedisPool};
pub use redis_store::RedisStore;
pub use store::{CreateOutcome, Keyspace, ReportKind, WeatherStore};
