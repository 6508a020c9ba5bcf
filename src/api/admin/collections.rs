//! Cache injection and vector point administration

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{Ack, ApiError, Json};
use crate::infrastructure::services::CollectionPoint;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCacheEntryRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub sql: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListPointsQuery {
    #[serde(default)]
    pub collection: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPointsResponse {
    pub collection: String,
    pub points: Vec<CollectionPoint>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePointRequest {
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub sql: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletePointRequest {
    pub collection: Option<String>,
    #[serde(default)]
    pub id: String,
}

/// POST /admin/cache/create
pub async fn create_cache_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateCacheEntryRequest>,
) -> Result<(StatusCode, Json<Ack>), ApiError> {
    let id = state
        .collection_service
        .inject(&request.prompt, &request.sql)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(
            Ack::new(
                "success",
                "Cache berhasil disuntikkan. Pertanyaan ini sekarang akan di-bypass dari LLM.",
            )
            .with_id(id),
        ),
    ))
}

/// GET /admin/qdrant/list?collection=
pub async fn list_points(
    State(state): State<AppState>,
    Query(query): Query<ListPointsQuery>,
) -> Result<Json<ListPointsResponse>, ApiError> {
    let points = state.collection_service.list(&query.collection).await?;
    let total = points.len();

    Ok(Json(ListPointsResponse {
        collection: query.collection,
        points,
        total,
    }))
}

/// POST|PUT /admin/qdrant/update
pub async fn update_point(
    State(state): State<AppState>,
    Json(request): Json<UpdatePointRequest>,
) -> Result<Json<Ack>, ApiError> {
    state
        .collection_service
        .update(&request.collection, &request.id, &request.prompt, &request.sql)
        .await?;

    Ok(Json(
        Ack::new("updated", format!("Data ID {} berhasil diperbarui.", request.id))
            .with_id(request.id),
    ))
}

/// POST|DELETE /admin/qdrant/delete
pub async fn delete_point(
    State(state): State<AppState>,
    Json(request): Json<DeletePointRequest>,
) -> Result<Json<Ack>, ApiError> {
    let collection = state
        .collection_service
        .delete(request.collection.as_deref(), &request.id)
        .await?;

    Ok(Json(
        Ack::new(
            "deleted",
            format!("Data ID {} dihapus dari '{}'.", request.id, collection),
        )
        .with_id(request.id),
    ))
}
