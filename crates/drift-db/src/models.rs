/// Database row types — these map directly to SQLite rows.
/// Distinct from the drift-types API models so the DB layer stays independent.

pub struct RoomRow {
    pub id: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub created_at: String,
    pub expires_at: String,
}

pub struct FileRow {
    pub id: String,
    pub room_id: String,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_path: String,
    pub encrypted_key: Option<String>,
    pub created_at: String,
    pub expires_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub room_id: String,
    pub sender_name: String,
    pub content: String,
    pub file_id: Option<String>,
    pub created_at: String,
}
