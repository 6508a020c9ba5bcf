use axum::{extract::State, http::StatusCode};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{Ack, Json};
use crate::infrastructure::services::RetrainStatus;

/// POST /admin/retrain
pub async fn retrain(State(state): State<AppState>) -> (StatusCode, Json<Ack>) {
    info!("Retrain requested");

    let ack = match state.training_service.spawn_retrain() {
        RetrainStatus::Started => Ack::new("accepted", "Proses retraining RAG dimulai"),
        RetrainStatus::AlreadyRunning => {
            Ack::new("accepted", "Proses retraining RAG sedang berjalan")
        }
    };

    (StatusCode::ACCEPTED, Json(ack))
}
