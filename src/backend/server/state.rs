/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` holds every process-wide handle, each built once at startup:
 * - Configuration
 * - Database pool
 * - Code cache (Redis or in-memory)
 * - Mailer (SMTP or log)
 * - Token codec and the session issuer built on it
 * - Audit log
 *
 * Nothing is global. A handler that needs a handle extracts it through
 * `State<...>`, so a handle that was never built cannot be reached.
 *
 * # Example
 *
 * ```rust,no_run
 * use axum::extract::State;
 * use tourfleet::backend::db::Database;
 *
 * async fn handler(State(db): State<Database>) {
 *     let _sql = db.sql("SELECT 1");
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::audit::AuditLog;
use crate::backend::auth::service::AuthService;
use crate::backend::auth::sessions::TokenCodec;
use crate::backend::cache::CodeCache;
use crate::backend::db::Database;
use crate::backend::email::Mailer;
use crate::shared::config::AppConfig;

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub cache: Arc<dyn CodeCache>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: TokenCodec,
    pub auth: AuthService,
    pub audit: Arc<AuditLog>,
}

impl AppState {
    /// Wire the services on top of already-connected handles.
    pub fn new(
        config: AppConfig,
        db: Database,
        cache: Arc<dyn CodeCache>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = TokenCodec::new(config.secret());
        let auth = AuthService::new(
            db.clone(),
            cache.clone(),
            mailer.clone(),
            tokens.clone(),
            &config,
        );
        let audit = Arc::new(AuditLog::new(config.audit.dir.clone()));

        Self {
            config: Arc::new(config),
            db,
            cache,
            mailer,
            tokens,
            auth,
            audit,
        }
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<AuditLog> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.audit.clone()
    }
}
