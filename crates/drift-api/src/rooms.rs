use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use drift_db::models::RoomRow;
use drift_db::{ts_from_sql, ts_to_sql};
use drift_types::api::{CreateRoomRequest, ValidatePasswordRequest, ValidatePasswordResponse};
use drift_types::models::Room;

use crate::{AppState, password};

/// POST /api/rooms — create a room with a computed expiry and, when a
/// password is supplied, a salted hash in place of the plaintext.
pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let created_at = Utc::now();
    let expires_at = req.expiry_hours.expires_at(created_at);

    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(plain) => Some(password::hash_password(plain).map_err(|e| {
            error!("room password hashing failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?),
        None => None,
    };

    let row = RoomRow {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        password_hash,
        created_at: ts_to_sql(created_at),
        expires_at: ts_to_sql(expires_at),
    };

    let response = Room {
        id: row.id.clone(),
        name: row.name.clone(),
        has_password: row.password_hash.is_some(),
        created_at,
        expires_at,
    };

    let db = state.db.clone();
    tokio::task::spawn_blocking(move || db.insert_room(&row))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("room insert failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/rooms/{id} — external projection; the hash never leaves the
/// server, clients only learn whether one is set.
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || db.get_room(&room_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("room lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(room_to_api(&row)?))
}

/// POST /api/rooms/{id}/validate-password — fails closed: an unknown room is
/// invalid, never "no password set". Always 200, so the response does not
/// leak whether the room exists.
pub async fn validate_password(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<ValidatePasswordRequest>,
) -> Result<Json<ValidatePasswordResponse>, StatusCode> {
    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || db.get_room(&room_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("room lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(ValidatePasswordResponse {
        valid: check_room_password(row.as_ref(), &req.password),
    }))
}

/// Room password policy: no stored hash means the room is open to any input;
/// a stored hash must verify; a lookup miss is invalid.
pub fn check_room_password(room: Option<&RoomRow>, supplied: &str) -> bool {
    match room {
        None => false,
        Some(row) => match &row.password_hash {
            None => true,
            Some(hash) => password::verify_password(hash, supplied),
        },
    }
}

pub(crate) fn room_to_api(row: &RoomRow) -> Result<Room, StatusCode> {
    let created_at = ts_from_sql(&row.created_at).map_err(|e| {
        error!("corrupt created_at '{}' on room '{}': {}", row.created_at, row.id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let expires_at = ts_from_sql(&row.expires_at).map_err(|e| {
        error!("corrupt expires_at '{}' on room '{}': {}", row.expires_at, row.id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Room {
        id: row.id.clone(),
        name: row.name.clone(),
        has_password: row.password_hash.is_some(),
        created_at,
        expires_at,
    })
}
