//! Bounded Redis connection pool.
//!
//! Connections are checked out with [`RedisPool::get`] and returned when the
//! [`PooledConnection`] guard is dropped, on every exit path. At most
//! `max_active` connections are checked out at once (0 means no limit); at
//! most `max_idle` are kept for reuse.

use parking_lot::Mutex;
use redis::{aio::MultiplexedConnection, Client, RedisResult};
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

use wx_common::{WxError, WxResult};

/// Pool limits.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Max connections kept open while unused
    pub max_idle: usize,
    /// Max connections checked out at the same time, 0 for no limit
    pub max_active: usize,
    /// How long a checkout waits for a free slot
    pub checkout_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: 50,
            max_active: 10_000,
            checkout_timeout: Duration::from_secs(5),
        }
    }
}

/// Redis connection pool with scoped checkout.
pub struct RedisPool {
    client: Client,
    idle: Mutex<Vec<MultiplexedConnection>>,
    active: Semaphore,
    config: PoolConfig,
}

impl RedisPool {
    /// Create a pool. Connections are opened lazily on first checkout.
    pub fn new(redis_url: &str, config: PoolConfig) -> WxResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| WxError::StorageError(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            idle: Mutex::new(Vec::with_capacity(config.max_idle)),
            active: Semaphore::new(active_limit(config.max_active)),
            config,
        })
    }

    /// Check out a connection, opening a new one if none is idle.
    pub async fn get(&self) -> WxResult<PooledConnection<'_>> {
        let permit = tokio::time::timeout(self.config.checkout_timeout, self.active.acquire())
            .await
            .map_err(|_| {
                WxError::PoolExhausted(format!(
                    "all {} connections busy for {:?}",
                    self.config.max_active, self.config.checkout_timeout
                ))
            })?
            .map_err(|e| WxError::StorageError(format!("Pool closed: {}", e)))?;

        let reused = self.idle.lock().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => {
                debug!("Opening new Redis connection");
                self.client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| WxError::StorageError(format!("Redis connection failed: {}", e)))?
            }
        };

        Ok(PooledConnection {
            conn,
            pool: self,
            reusable: true,
            _permit: permit,
        })
    }

    /// Number of connections kept for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Number of connections currently checked out.
    pub fn active_count(&self) -> usize {
        active_limit(self.config.max_active) - self.active.available_permits()
    }

    /// Whether checkouts are capped by `max_active`.
    pub fn is_bounded(&self) -> bool {
        self.config.max_active > 0
    }

    fn put_back(&self, conn: MultiplexedConnection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_idle {
            idle.push(conn);
        }
    }
}

fn active_limit(max_active: usize) -> usize {
    if max_active == 0 {
        Semaphore::MAX_PERMITS
    } else {
        max_active.min(Semaphore::MAX_PERMITS)
    }
}

/// A checked-out connection, returned to the pool on drop.
pub struct PooledConnection<'a> {
    conn: MultiplexedConnection,
    pool: &'a RedisPool,
    reusable: bool,
    _permit: SemaphorePermit<'a>,
}

impl PooledConnection<'_> {
    /// Pass a command result through, discarding the connection if it broke.
    pub fn check<T>(&mut self, result: RedisResult<T>) -> RedisResult<T> {
        if let Err(e) = &result {
            if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
                self.reusable = false;
            }
        }
        result
    }
}

impl Deref for PooledConnection<'_> {
    type Target = MultiplexedConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if self.reusable {
            self.pool.put_back(self.conn.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = PoolConfig::default();
        assert_eq!(config.max_idle, 50);
        assert_eq!(config.max_active, 10_000);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = RedisPool::new("not a url", PoolConfig::default());
        assert!(matches!(result, Err(WxError::StorageError(_))));
    }

    #[test]
    fn test_zero_max_active_is_unbounded() {
        assert_eq!(active_limit(0), Semaphore::MAX_PERMITS);
        assert_eq!(active_limit(1), 1);

        let config = PoolConfig {
            max_active: 0,
            ..PoolConfig::default()
        };
        let pool = RedisPool::new("redis://127.0.0.1:6379", config).unwrap();
        assert!(!pool.is_bounded());
        assert_eq!(pool.active_count(), 0);
    }

    #[tokio::test]
    async fn test_unbounded_checkout_does_not_wait_for_slot() {
        // Nothing listens on port 1: the checkout gets a slot, then fails to connect
        let config = PoolConfig {
            max_active: 0,
            checkout_timeout: Duration::from_millis(100),
            ..PoolConfig::default()
        };
        let pool = RedisPool::new("redis://127.0.0.1:1", config).unwrap();
        let err = pool.get().await.err().unwrap();
        assert!(matches!(err, WxError::StorageError(_)));
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_new_pool_is_empty() {
        let pool = RedisPool::new("redis://127.0.0.1:6379", PoolConfig::default()).unwrap();
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.active_count(), 0);
    }
}
