//! Natural-language query endpoint

use axum::extract::State;
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, QueryResponse};

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub prompt: String,
}

/// POST /api/query
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    debug!(prompt_len = request.prompt.len(), "Query received");

    let outcome = state.query_service.resolve(&request.prompt).await?;

    Ok(Json(QueryResponse::from(outcome)))
}
