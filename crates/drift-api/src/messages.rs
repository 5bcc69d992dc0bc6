use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use drift_db::models::MessageRow;
use drift_db::{ts_from_sql, ts_to_sql};
use drift_types::api::CreateMessageRequest;
use drift_types::models::RoomMessage;

use crate::AppState;

enum InsertOutcome {
    Created,
    RoomMissing,
    FileMissing,
}

/// POST /api/messages — sender_name is free text, not a durable identity.
/// An optional file reference must point at a live file record; the store
/// clears it later if that file is purged.
pub async fn create_message(
    State(state): State<AppState>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.sender_name.trim().is_empty() || req.content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let created_at = Utc::now();
    let row = MessageRow {
        id: Uuid::new_v4().to_string(),
        room_id: req.room_id,
        sender_name: req.sender_name,
        content: req.content,
        file_id: req.file_id,
        created_at: ts_to_sql(created_at),
    };

    let response = RoomMessage {
        id: row.id.clone(),
        room_id: row.room_id.clone(),
        sender_name: row.sender_name.clone(),
        content: row.content.clone(),
        file_id: row.file_id.clone(),
        created_at,
    };

    let db = state.db.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        if db.get_room(&row.room_id)?.is_none() {
            return Ok(InsertOutcome::RoomMissing);
        }
        if let Some(file_id) = &row.file_id {
            if db.get_file(file_id)?.is_none() {
                return Ok(InsertOutcome::FileMissing);
            }
        }
        db.insert_message(&row)?;
        Ok::<_, anyhow::Error>(InsertOutcome::Created)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("message insert failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match outcome {
        InsertOutcome::Created => Ok((StatusCode::CREATED, Json(response))),
        InsertOutcome::RoomMissing => Err(StatusCode::NOT_FOUND),
        InsertOutcome::FileMissing => Err(StatusCode::BAD_REQUEST),
    }
}

/// GET /api/rooms/{id}/messages — newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || db.get_messages_by_room(&room_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("message listing failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let messages = rows
        .iter()
        .map(message_to_api)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(messages))
}

pub(crate) fn message_to_api(row: &MessageRow) -> Result<RoomMessage, StatusCode> {
    let created_at = ts_from_sql(&row.created_at).map_err(|e| {
        error!("corrupt created_at '{}' on message '{}': {}", row.created_at, row.id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(RoomMessage {
        id: row.id.clone(),
        room_id: row.room_id.clone(),
        sender_name: row.sender_name.clone(),
        content: row.content.clone(),
        file_id: row.file_id.clone(),
        created_at,
    })
}
