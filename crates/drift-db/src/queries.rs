use crate::models::{FileRow, MessageRow, RoomRow};
use crate::{Database, ts_to_sql};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

impl Database {
    // -- Rooms --

    pub fn insert_room(&self, room: &RoomRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO rooms (id, name, password_hash, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    room.id,
                    room.name,
                    room.password_hash,
                    room.created_at,
                    room.expires_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_room(&self, id: &str) -> Result<Option<RoomRow>> {
        self.with_conn(|conn| query_room(conn, id))
    }

    /// Delete every room whose expiry has passed. SQLite cascades the delete
    /// to the room's files and messages within the same statement, so a crash
    /// mid-sweep cannot strand children of a deleted room.
    ///
    /// Idempotent: a second call with no intervening writes deletes nothing.
    pub fn sweep_expired_rooms(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM rooms WHERE expires_at < ?1",
                [ts_to_sql(now)],
            )?;
            Ok(deleted)
        })
    }

    // -- Files --

    pub fn insert_file(&self, file: &FileRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO files (id, room_id, filename, file_size, mime_type,
                                    storage_path, encrypted_key, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    file.id,
                    file.room_id,
                    file.filename,
                    file.file_size,
                    file.mime_type,
                    file.storage_path,
                    file.encrypted_key,
                    file.created_at,
                    file.expires_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_file(&self, id: &str) -> Result<Option<FileRow>> {
        self.with_conn(|conn| query_file(conn, id))
    }

    pub fn get_files_by_room(&self, room_id: &str) -> Result<Vec<FileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, filename, file_size, mime_type,
                        storage_path, encrypted_key, created_at, expires_at
                 FROM files
                 WHERE room_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([room_id], file_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete every file record whose own expiry has passed. A message that
    /// referenced a deleted file has its file_id set NULL by the store, never
    /// left dangling. The blob at storage_path is an external concern.
    pub fn sweep_expired_files(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM files WHERE expires_at < ?1",
                [ts_to_sql(now)],
            )?;
            Ok(deleted)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, room_id, sender_name, content, file_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    message.id,
                    message.room_id,
                    message.sender_name,
                    message.content,
                    message.file_id,
                    message.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, sender_name, content, file_id, created_at
                 FROM messages WHERE id = ?1",
            )?;
            stmt.query_row([id], message_from_row).optional()
        })
    }

    pub fn get_messages_by_room(&self, room_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, sender_name, content, file_id, created_at
                 FROM messages
                 WHERE room_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([room_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_room(conn: &Connection, id: &str) -> Result<Option<RoomRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, password_hash, created_at, expires_at FROM rooms WHERE id = ?1",
    )?;

    stmt.query_row([id], |row| {
        Ok(RoomRow {
            id: row.get(0)?,
            name: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: row.get(3)?,
            expires_at: row.get(4)?,
        })
    })
    .optional()
}

fn query_file(conn: &Connection, id: &str) -> Result<Option<FileRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, room_id, filename, file_size, mime_type,
                storage_path, encrypted_key, created_at, expires_at
         FROM files WHERE id = ?1",
    )?;

    stmt.query_row([id], file_from_row).optional()
}

fn file_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<FileRow, rusqlite::Error> {
    Ok(FileRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        filename: row.get(2)?,
        file_size: row.get(3)?,
        mime_type: row.get(4)?,
        storage_path: row.get(5)?,
        encrypted_key: row.get(6)?,
        created_at: row.get(7)?,
        expires_at: row.get(8)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        sender_name: row.get(2)?,
        content: row.get(3)?,
        file_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
