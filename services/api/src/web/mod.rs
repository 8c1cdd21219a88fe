pub mod admin;
pub mod auth;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::{require_admin, require_auth};
use state::AppState;

/// Builds every API route on top of the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/catalog", get(rest::catalog_handler))
        .route("/estimates", post(rest::create_estimate_handler))
        .route("/estimates/{id}", get(rest::get_estimate_handler))
        .route("/estimates/{id}/commands", post(rest::apply_command_handler))
        .route("/estimates/{id}/export", get(rest::export_estimate_handler));

    // Routes for any logged-in user
    let user_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/estimates/{id}/quote", post(rest::submit_quote_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Admin panel; layers run outside-in, so auth resolves the user before the admin check
    let admin_routes = Router::new()
        .route("/admin/requests", get(admin::list_requests_handler))
        .route("/admin/requests/refresh", post(admin::refresh_requests_handler))
        .route(
            "/admin/requests/{request_type}/{id}",
            get(admin::request_details_handler),
        )
        .route(
            "/admin/requests/{request_type}/{id}/reply",
            post(admin::reply_handler),
        )
        .route(
            "/admin/requests/{request_type}/{id}/solve",
            post(admin::solve_handler),
        )
        .layer(axum_middleware::from_fn(require_admin))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
