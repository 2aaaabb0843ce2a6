/**
 * One-Time Codes
 *
 * Numeric codes stored in the [`CodeCache`] under `otp:<email>` with a
 * mandatory TTL. Issuing a new code for an email overwrites the previous one.
 * Redeeming a code removes it in the same cache operation that compares it,
 * so a code is accepted at most once.
 */

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::backend::cache::{CacheError, CodeCache};
use crate::shared::strings::normalize_email;

/// Cache key for an email's pending code
pub fn cache_key(email: &str) -> String {
    format!("otp:{}", normalize_email(email))
}

/// A uniformly random string of ASCII digits
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    /// Wrong code, or no code pending
    Rejected,
}

#[derive(Clone)]
pub struct OtpStore {
    cache: Arc<dyn CodeCache>,
    length: usize,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(cache: Arc<dyn CodeCache>, length: usize, ttl: Duration) -> Self {
        Self { cache, length, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate and store a fresh code, replacing any pending one.
    pub async fn issue(&self, email: &str) -> Result<String, CacheError> {
        let code = generate_code(self.length);
        self.cache.set(&cache_key(email), &code, self.ttl).await?;
        tracing::debug!("Issued one-time code for {}", normalize_email(email));
        Ok(code)
    }

    /// Compare and remove the pending code. A cache failure is an error,
    /// never an acceptance.
    pub async fn redeem(&self, email: &str, code: &str) -> Result<OtpCheck, CacheError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(OtpCheck::Rejected);
        }
        if self.cache.take_matching(&cache_key(email), code).await? {
            Ok(OtpCheck::Valid)
        } else {
            Ok(OtpCheck::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::cache::MemoryCodeCache;
    use async_trait::async_trait;

    fn store() -> OtpStore {
        OtpStore::new(Arc::new(MemoryCodeCache::new()), 8, Duration::from_secs(300))
    }

    #[test]
    fn test_code_shape() {
        for _ in 0..50 {
            let code = generate_code(8);
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_cache_key_is_normalized() {
        assert_eq!(cache_key(" Alice@Example.COM "), "otp:alice@example.com");
    }

    /// Stores codes but cannot remove them
    struct StuckCache(MemoryCodeCache);

    #[async_trait]
    impl CodeCache for StuckCache {
        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            self.0.set(key, value, ttl).await
        }

        async fn get(&self, key: &str) -> Result<String, CacheError> {
            self.0.get(key).await
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection reset".to_string()))
        }

        async fn take_matching(&self, _key: &str, _expected: &str) -> Result<bool, CacheError> {
            Err(CacheError::Backend("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_redeem_is_single_use() {
        let otp = store();
        let code = otp.issue("a@x.com").await.unwrap();
        assert_eq!(otp.redeem("a@x.com", "00000000x").await.unwrap(), OtpCheck::Rejected);
        assert_eq!(otp.redeem("a@x.com", "").await.unwrap(), OtpCheck::Rejected);

        assert_eq!(otp.redeem("A@X.com", &format!(" {} ", code)).await.unwrap(), OtpCheck::Valid);
        assert_eq!(otp.redeem("a@x.com", &code).await.unwrap(), OtpCheck::Rejected);
    }

    #[tokio::test]
    async fn test_redeem_fails_when_code_cannot_be_removed() {
        let otp = OtpStore::new(
            Arc::new(StuckCache(MemoryCodeCache::new())),
            8,
            Duration::from_secs(300),
        );
        let code = otp.issue("a@x.com").await.unwrap();

        for _ in 0..2 {
            let err = otp.redeem("a@x.com", &code).await.unwrap_err();
            assert!(matches!(err, CacheError::Backend(_)));
        }
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_code() {
        let otp = store();
        let first = otp.issue("a@x.com").await.unwrap();
        let mut second = otp.issue("a@x.com").await.unwrap();
        while second == first {
            second = otp.issue("a@x.com").await.unwrap();
        }
        assert_eq!(otp.redeem("a@x.com", &first).await.unwrap(), OtpCheck::Rejected);
        assert_eq!(otp.redeem("a@x.com", &second).await.unwrap(), OtpCheck::Valid);
    }
}
