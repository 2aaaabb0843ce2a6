//! Ephemeral Code Cache
//!
//! One-time codes live in a TTL key-value store. The [`CodeCache`] trait is
//! the seam between the session flows and the store; the server picks a
//! backend once at startup and hands the same `Arc<dyn CodeCache>` to every
//! component that needs it.
//!
//! - **`redis`** - `SET key value EX secs` / `GET` / `DEL` against Redis, with
//!   compare-and-delete done in a server-side script
//! - **`memory`** - in-process map with per-entry expiry, for single-instance
//!   deployments and tests

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCodeCache;
pub use self::redis::RedisCodeCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("key not found")]
    NotFound,

    #[error("key expired")]
    Expired,

    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Not-found and expired both mean "no usable value".
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::NotFound | Self::Expired)
    }
}

#[async_trait]
pub trait CodeCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<String, CacheError>;

    /// Remove `key`; deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically remove `key` if it currently holds `expected`. Returns
    /// whether the entry was removed; a miss or a different value is
    /// `Ok(false)`. At most one concurrent caller can win a given entry.
    async fn take_matching(&self, key: &str, expected: &str) -> Result<bool, CacheError>;
}
