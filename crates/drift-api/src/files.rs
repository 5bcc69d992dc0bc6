use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use tracing::error;
use uuid::Uuid;

use drift_db::models::FileRow;
use drift_db::{ts_from_sql, ts_to_sql};
use drift_types::api::CreateFileRequest;
use drift_types::models::RoomFile;

use crate::AppState;

/// Default retention for a file record, independent of its room's TTL.
const DEFAULT_TTL_HOURS: i64 = 24;
/// Upper bound on client-chosen retention (one week).
const MAX_TTL_HOURS: i64 = 168;

/// POST /api/files — record metadata for a blob an external store already
/// holds at `storage_path`. This service never touches the bytes.
pub async fn create_file(
    State(state): State<AppState>,
    Json(req): Json<CreateFileRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.filename.is_empty() || req.file_size < 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let ttl_hours = req.ttl_hours.unwrap_or(DEFAULT_TTL_HOURS);
    if !(1..=MAX_TTL_HOURS).contains(&ttl_hours) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let created_at = Utc::now();
    let expires_at = created_at + Duration::hours(ttl_hours);

    let row = FileRow {
        id: Uuid::new_v4().to_string(),
        room_id: req.room_id,
        filename: req.filename,
        file_size: req.file_size,
        mime_type: req.mime_type,
        storage_path: req.storage_path,
        encrypted_key: req.encrypted_key,
        created_at: ts_to_sql(created_at),
        expires_at: ts_to_sql(expires_at),
    };

    let response = RoomFile {
        id: row.id.clone(),
        room_id: row.room_id.clone(),
        filename: row.filename.clone(),
        file_size: row.file_size,
        mime_type: row.mime_type.clone(),
        storage_path: row.storage_path.clone(),
        encrypted_key: row.encrypted_key.clone(),
        created_at,
        expires_at,
    };

    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        if db.get_room(&row.room_id)?.is_none() {
            return Ok(false);
        }
        db.insert_file(&row)?;
        Ok::<_, anyhow::Error>(true)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("file insert failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .then_some(())
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/rooms/{id}/files — newest first. An unknown room lists empty.
pub async fn list_files(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || db.get_files_by_room(&room_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("file listing failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let files = rows
        .iter()
        .map(file_to_api)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(files))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || db.get_file(&file_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("file lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(file_to_api(&row)?))
}

pub(crate) fn file_to_api(row: &FileRow) -> Result<RoomFile, StatusCode> {
    let created_at = ts_from_sql(&row.created_at).map_err(|e| {
        error!("corrupt created_at '{}' on file '{}': {}", row.created_at, row.id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let expires_at = ts_from_sql(&row.expires_at).map_err(|e| {
        error!("corrupt expires_at '{}' on file '{}': {}", row.expires_at, row.id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(RoomFile {
        id: row.id.clone(),
        room_id: row.room_id.clone(),
        filename: row.filename.clone(),
        file_size: row.file_size,
        mime_type: row.mime_type.clone(),
        storage_path: row.storage_path.clone(),
        encrypted_key: row.encrypted_key.clone(),
        created_at,
        expires_at,
    })
}
