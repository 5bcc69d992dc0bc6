use serde::{Deserialize, Serialize};

use crate::models::RoomTtl;

// -- Rooms --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRoomRequest {
    pub name: String,
    pub expiry_hours: RoomTtl,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ValidatePasswordResponse {
    pub valid: bool,
}

// -- Files --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateFileRequest {
    pub room_id: String,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_path: String,
    pub encrypted_key: Option<String>,
    /// Hours until the record expires; defaults to 24 when omitted.
    pub ttl_hours: Option<i64>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMessageRequest {
    pub room_id: String,
    pub sender_name: String,
    pub content: String,
    pub file_id: Option<String>,
}

// -- Sweep --

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    pub rooms_deleted: usize,
    pub files_deleted: usize,
}
