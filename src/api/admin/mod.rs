//! Admin endpoints for the retrieval index and the vector collections

pub mod collections;
pub mod retrain;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/retrain", post(retrain::retrain))
        .route("/cache/create", post(collections::create_cache_entry))
        .route("/qdrant/list", get(collections::list_points))
        .route(
            "/qdrant/update",
            post(collections::update_point).put(collections::update_point),
        )
        .route(
            "/qdrant/delete",
            post(collections::delete_point).delete(collections::delete_point),
        )
}
