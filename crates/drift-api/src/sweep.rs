use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::{error, info};

use drift_types::api::SweepResponse;

use crate::AppState;

/// POST /api/cleanup — external-scheduler entry point for the expiry sweeps.
/// Files go first so their message references clear before any room cascade;
/// both statements are idempotent, so a concurrent or repeated trigger is
/// harmless.
pub async fn trigger_sweep(
    State(state): State<AppState>,
) -> Result<Json<SweepResponse>, StatusCode> {
    let db = state.db.clone();
    let (files_deleted, rooms_deleted) = tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let files = db.sweep_expired_files(now)?;
        let rooms = db.sweep_expired_rooms(now)?;
        Ok::<_, anyhow::Error>((files, rooms))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("sweep failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if files_deleted > 0 || rooms_deleted > 0 {
        info!(
            "sweep: deleted {} expired files, {} expired rooms",
            files_deleted, rooms_deleted
        );
    }

    Ok(Json(SweepResponse {
        success: true,
        rooms_deleted,
        files_deleted,
    }))
}
