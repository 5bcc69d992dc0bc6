use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS rooms (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            password_hash   TEXT,
            created_at      TEXT NOT NULL,
            expires_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS files (
            id              TEXT PRIMARY KEY,
            room_id         TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            filename        TEXT NOT NULL,
            file_size       INTEGER NOT NULL,
            mime_type       TEXT NOT NULL,
            storage_path    TEXT NOT NULL,
            encrypted_key   TEXT,
            created_at      TEXT NOT NULL,
            expires_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_files_room
            ON files(room_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_files_expiry
            ON files(expires_at);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            room_id         TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            sender_name     TEXT NOT NULL,
            content         TEXT NOT NULL,
            file_id         TEXT REFERENCES files(id) ON DELETE SET NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_room
            ON messages(room_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_rooms_expiry
            ON rooms(expires_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
