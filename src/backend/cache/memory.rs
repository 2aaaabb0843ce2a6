//! In-process code cache with per-entry expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use super::{CacheError, CodeCache};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCodeCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl CodeCache for MemoryCodeCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let entries = self.entries.read().await;
        let entry = entries.get(key).ok_or(CacheError::NotFound)?;
        if entry.expires_at <= Instant::now() {
            return Err(CacheError::Expired);
        }
        Ok(entry.value.clone())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn take_matching(&self, key: &str, expected: &str) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get(key) else {
            return Ok(false);
        };
        if entry.expires_at <= Instant::now() {
            entries.remove(key);
            return Ok(false);
        }
        let matches = entry.value.len() == expected.len()
            && bool::from(entry.value.as_bytes().ct_eq(expected.as_bytes()));
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }
}
