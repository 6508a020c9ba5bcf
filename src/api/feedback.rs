//! Correction feedback and cache forgetting

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{Ack, ApiError, Json};

#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionRequest {
    #[serde(default)]
    pub prompt_asli: String,
    #[serde(default)]
    pub sql_koreksi: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgetRequest {
    pub prompt: Option<String>,
    pub id: Option<String>,
}

/// POST /api/feedback/koreksi
pub async fn submit_correction(
    State(state): State<AppState>,
    Json(request): Json<CorrectionRequest>,
) -> Result<(StatusCode, Json<Ack>), ApiError> {
    state
        .training_service
        .record_correction(&request.prompt_asli, &request.sql_koreksi)
        .await?;

    info!(prompt = %request.prompt_asli.trim(), "Correction feedback stored");

    Ok((
        StatusCode::CREATED,
        Json(Ack::new(
            "sukses",
            "Feedback koreksi berhasil disimpan. Silakan 'retrain' untuk menerapkan.",
        )),
    ))
}

/// POST|DELETE /api/cache/forget
pub async fn forget_cache(
    State(state): State<AppState>,
    Json(request): Json<ForgetRequest>,
) -> Result<Json<Ack>, ApiError> {
    state
        .collection_service
        .forget(request.prompt.as_deref(), request.id.as_deref())
        .await?;

    Ok(Json(Ack::new("deleted", "Cache berhasil dihapus")))
}
