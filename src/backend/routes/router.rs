/**
 * Router Configuration
 *
 * Combines the API routes with the health check, uploaded-file serving and
 * the fallback, then applies the outer layers.
 *
 * # Layer Order (outermost first)
 *
 * 1. Transaction middleware: transaction id, body capture, audit trail
 * 2. CORS
 * 3. Request tracing
 * 4. Per-group authentication (`route_layer`, see `api_routes`)
 */

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::backend::error::ApiError;
use crate::backend::middleware::{transaction_middleware, API_KEY_HEADER, TRANSACTION_HEADER};
use crate::backend::response::{ApiResponse, ApiResult};
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

async fn health() -> ApiResult<()> {
    Ok(ApiResponse::message("ok"))
}

async fn not_found() -> ApiError {
    ApiError::not_found("route not found")
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .expose_headers([HeaderName::from_static(TRANSACTION_HEADER)])
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let upload_dir = app_state.config.upload.dir.clone();
    let cors = cors_layer(&app_state.config.server.cors_origins);
    let audit = app_state.audit.clone();

    Router::new()
        .route("/health", get(health))
        .nest("/api", configure_api_routes(&app_state))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(from_fn_with_state(audit, transaction_middleware))
        .with_state(app_state)
}
