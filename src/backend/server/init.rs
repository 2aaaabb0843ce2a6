/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Create the audit and upload directories
 * 2. Load the database, code cache and mailer
 * 3. Build `AppState`
 * 4. Start the cache expiry sweep (in-memory cache only)
 * 5. Create the router
 */

use std::time::Duration;

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{
    ensure_directories, load_cache, load_database, load_mailer, StartupError,
};
use crate::backend::server::state::AppState;
use crate::shared::config::AppConfig;

/// How often expired codes are swept from the in-memory cache
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Create and configure the Axum application
///
/// # Errors
///
/// Any handle that cannot be built stops startup; see [`StartupError`].
pub async fn create_app(config: AppConfig) -> Result<Router<()>, StartupError> {
    tracing::info!("Initializing tourfleet backend server");

    ensure_directories(&config)?;

    let db = load_database(&config).await?;
    let (cache, memory_cache) = load_cache(&config).await?;
    let mailer = load_mailer(&config)?;

    let app_state = AppState::new(config, db, cache, mailer);

    if let Some(memory_cache) = memory_cache {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let purged = memory_cache.purge_expired().await;
                if purged > 0 {
                    tracing::debug!("Purged {} expired codes", purged);
                }
            }
        });
    }

    let app = create_router(app_state);
    tracing::info!("Router configured");
    Ok(app)
}
