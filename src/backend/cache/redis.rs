//! Redis-backed code cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{CacheError, CodeCache};

/// Deletes KEYS[1] only while it still holds ARGV[1]
const TAKE_MATCHING: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// Shares one multiplexed, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisCodeCache {
    connection: ConnectionManager,
}

impl RedisCodeCache {
    /// Open the connection and check it with a `PING`.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let mut connection = ConnectionManager::new(client).await.map_err(backend)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(backend)?;
        tracing::info!("Connected to Redis code cache");
        Ok(Self { connection })
    }
}

#[async_trait]
impl CodeCache for RedisCodeCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = connection
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(key).await.map_err(backend)?;
        // Redis drops expired keys itself, so expiry surfaces as a miss.
        value.ok_or(CacheError::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(key).await.map_err(backend)?;
        Ok(())
    }

    async fn take_matching(&self, key: &str, expected: &str) -> Result<bool, CacheError> {
        let mut connection = self.connection.clone();
        let removed: i64 = redis::Script::new(TAKE_MATCHING)
            .key(key)
            .arg(expected)
            .invoke_async(&mut connection)
            .await
            .map_err(backend)?;
        Ok(removed == 1)
    }
}

fn backend(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}
