use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Lookup endpoints
        .route("/geocode", get(handlers::geocode))
        .route("/suggest", get(handlers::suggest))
        // Unmatched routes
        .fallback(handlers::route_not_found)
        // Middleware
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .with_state(state)
}
