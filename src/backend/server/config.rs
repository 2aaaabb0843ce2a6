/**
 * Server Handles
 *
 * Builds the process-wide handles from the validated [`AppConfig`]:
 *
 * 1. Database pool, then migrations
 * 2. Code cache, by `CACHE_DRIVER`
 * 3. Mailer, by `MAIL_DRIVER`
 *
 * # Error Handling
 *
 * Every failure here is fatal. The server never starts with a missing
 * database, cache or mail transport.
 */

use std::sync::Arc;

use thiserror::Error;

use crate::backend::cache::{CacheError, CodeCache, MemoryCodeCache, RedisCodeCache};
use crate::backend::db::{Database, StoreError};
use crate::backend::email::{LogMailer, MailError, Mailer, SmtpMailer};
use crate::shared::config::{AppConfig, CacheDriver, MailDriver};

/// Startup errors
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Database(#[from] StoreError),

    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    #[error("mailer: {0}")]
    Mail(#[from] MailError),

    #[error("{path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Connect to the configured database and apply migrations
pub async fn load_database(config: &AppConfig) -> Result<Database, StartupError> {
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database).await?;
    db.migrate().await?;
    Ok(db)
}

/// Build the configured code cache
///
/// Returns the in-memory backend as its concrete type too, so the caller can
/// schedule expiry sweeps for it.
pub async fn load_cache(
    config: &AppConfig,
) -> Result<(Arc<dyn CodeCache>, Option<MemoryCodeCache>), StartupError> {
    match config.cache.driver {
        CacheDriver::Redis => {
            tracing::info!("Connecting to Redis at {}:{}", config.cache.host, config.cache.port);
            let cache = RedisCodeCache::connect(&config.cache.redis_url()).await?;
            Ok((Arc::new(cache), None))
        }
        CacheDriver::Memory => {
            tracing::warn!("Using in-memory code cache; codes are lost on restart and not shared between instances");
            let cache = MemoryCodeCache::new();
            Ok((Arc::new(cache.clone()), Some(cache)))
        }
    }
}

/// Build the configured mailer
pub fn load_mailer(config: &AppConfig) -> Result<Arc<dyn Mailer>, StartupError> {
    match config.smtp.driver {
        MailDriver::Smtp => {
            let mailer = SmtpMailer::from_config(&config.smtp)?;
            tracing::info!("SMTP mailer configured");
            Ok(Arc::new(mailer))
        }
        MailDriver::Log => {
            tracing::warn!("MAIL_DRIVER=log: emails are written to the log, not delivered");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Create the audit and upload directories if missing
pub fn ensure_directories(config: &AppConfig) -> Result<(), StartupError> {
    for dir in [&config.audit.dir, &config.upload.dir] {
        std::fs::create_dir_all(dir).map_err(|source| StartupError::Directory {
            path: dir.display().to_string(),
            source,
        })?;
    }
    Ok(())
}
