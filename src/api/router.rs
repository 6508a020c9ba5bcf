use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::admin;
use super::feedback;
use super::health;
use super::query;
use super::state::AppState;
use super::types::ApiError;

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query))
        .route("/feedback/koreksi", post(feedback::submit_correction))
        .route(
            "/cache/forget",
            post(feedback::forget_cache).delete(feedback::forget_cache),
        )
        .method_not_allowed_fallback(method_not_allowed)
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .nest(
            "/admin",
            admin::create_admin_router().method_not_allowed_fallback(method_not_allowed),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
