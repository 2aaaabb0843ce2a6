/**
 * API Routes
 *
 * Everything under `/api`, grouped by the credential it accepts.
 *
 * ## Public
 * - `POST /auth/register`, `/auth/verify-otp`, `/auth/resend-otp`
 * - `POST /auth/login`, `/auth/reset-password`, `/auth/update-password`
 *
 * ## Bearer only
 * - `GET /auth/me`, `PUT /user/profile`
 * - `GET|POST /users`, `GET|PUT|DELETE /users/{id}`
 * - `POST|GET|PUT /organization`, `POST /organization/join`
 * - `GET /organization/members`, `PUT /organization/members/{user_id}`
 * - `POST /organization/api-key`
 * - `GET /dashboard`, `POST /uploads`
 *
 * ## Bearer or API key
 * - `GET|POST /fleets`, `GET|PUT|DELETE /fleets/{id}`
 * - `GET|POST /tour-packages`, `GET|PUT|DELETE /tour-packages/{id}`
 * - `GET|POST /contents`, `GET|PUT|DELETE /contents/{id}`
 * - `POST /checkout/summary`, `GET|POST /orders`, `GET /orders/{id}`,
 *   `PUT /orders/{id}/status`
 *
 * The guards are `route_layer`s, so an unknown path still falls through to
 * the 404 fallback instead of answering 401.
 */

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;

use crate::backend::auth::handlers as auth;
use crate::backend::checkout::handlers as checkout;
use crate::backend::content::handlers as content;
use crate::backend::dashboard::get_dashboard;
use crate::backend::fleets::handlers as fleets;
use crate::backend::middleware::{require_auth, require_bearer};
use crate::backend::organizations::handlers as organizations;
use crate::backend::server::state::AppState;
use crate::backend::tour_packages::handlers as tour_packages;
use crate::backend::uploads::upload_file;
use crate::backend::users::handlers as users;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/resend-otp", post(auth::resend_otp))
        .route("/auth/login", post(auth::login))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/update-password", post(auth::update_password))
}

fn bearer_routes(state: &AppState) -> Router<AppState> {
    let upload_limit = state.config.upload.max_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/auth/me", get(auth::get_me))
        .route("/user/profile", put(users::update_profile))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/organization",
            post(organizations::create_organization)
                .get(organizations::get_organization)
                .put(organizations::update_organization),
        )
        .route("/organization/join", post(organizations::join_organization))
        .route("/organization/members", get(organizations::list_members))
        .route(
            "/organization/members/{user_id}",
            put(organizations::update_member),
        )
        .route("/organization/api-key", post(organizations::create_api_key))
        .route("/dashboard", get(get_dashboard))
        .route(
            "/uploads",
            post(upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer))
}

fn catalogue_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/fleets", get(fleets::list_fleets).post(fleets::create_fleet))
        .route(
            "/fleets/{id}",
            get(fleets::get_fleet)
                .put(fleets::update_fleet)
                .delete(fleets::delete_fleet),
        )
        .route(
            "/tour-packages",
            get(tour_packages::list_tour_packages).post(tour_packages::create_tour_package),
        )
        .route(
            "/tour-packages/{id}",
            get(tour_packages::get_tour_package)
                .put(tour_packages::update_tour_package)
                .delete(tour_packages::delete_tour_package),
        )
        .route(
            "/contents",
            get(content::list_contents).post(content::create_content),
        )
        .route(
            "/contents/{id}",
            get(content::get_content)
                .put(content::update_content)
                .delete(content::delete_content),
        )
        .route("/checkout/summary", post(checkout::checkout_summary))
        .route(
            "/orders",
            get(checkout::list_orders).post(checkout::create_order),
        )
        .route("/orders/{id}", get(checkout::get_order))
        .route("/orders/{id}/status", put(checkout::update_order_status))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

/// All `/api` routes, relative to the `/api` prefix
pub fn configure_api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(bearer_routes(state))
        .merge(catalogue_routes(state))
}
