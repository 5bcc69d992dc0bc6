/// Lifecycle tests: expiry sweeps, cascade deletes, and reference clearing.
///
/// Each test opens a fresh SQLite database in a temp directory and drives the
/// sweeps with synthetic timestamps, so nothing here waits on wall-clock time.

use chrono::{Duration, Utc};

use drift_db::models::{FileRow, MessageRow, RoomRow};
use drift_db::{Database, ts_to_sql};

fn open_temp_db() -> Database {
    let path = std::env::temp_dir().join(format!("drift_db_test_{}.db", uuid::Uuid::new_v4()));
    Database::open(&path).unwrap()
}

fn room(id: &str, expires_in: Duration) -> RoomRow {
    let now = Utc::now();
    RoomRow {
        id: id.into(),
        name: format!("room {}", id),
        password_hash: None,
        created_at: ts_to_sql(now),
        expires_at: ts_to_sql(now + expires_in),
    }
}

fn file(id: &str, room_id: &str, expires_in: Duration) -> FileRow {
    let now = Utc::now();
    FileRow {
        id: id.into(),
        room_id: room_id.into(),
        filename: "notes.pdf".into(),
        file_size: 2048,
        mime_type: "application/pdf".into(),
        storage_path: format!("blobs/{}", id),
        encrypted_key: None,
        created_at: ts_to_sql(now),
        expires_at: ts_to_sql(now + expires_in),
    }
}

fn message(id: &str, room_id: &str, file_id: Option<&str>) -> MessageRow {
    MessageRow {
        id: id.into(),
        room_id: room_id.into(),
        sender_name: "Ana".into(),
        content: "hello".into(),
        file_id: file_id.map(String::from),
        created_at: ts_to_sql(Utc::now()),
    }
}

#[test]
fn room_sweep_cascades_to_files_and_messages() {
    let db = open_temp_db();

    db.insert_room(&room("r1", Duration::hours(-1))).unwrap();
    db.insert_file(&file("f1", "r1", Duration::hours(24))).unwrap();
    db.insert_message(&message("m1", "r1", Some("f1"))).unwrap();

    let deleted = db.sweep_expired_rooms(Utc::now()).unwrap();
    assert_eq!(deleted, 1);

    assert!(db.get_room("r1").unwrap().is_none());
    assert!(db.get_file("f1").unwrap().is_none());
    assert!(db.get_message("m1").unwrap().is_none());
}

#[test]
fn file_sweep_clears_message_reference_without_deleting_message() {
    let db = open_temp_db();

    db.insert_room(&room("r1", Duration::hours(12))).unwrap();
    db.insert_file(&file("f1", "r1", Duration::minutes(-5))).unwrap();
    db.insert_message(&message("m1", "r1", Some("f1"))).unwrap();

    let deleted = db.sweep_expired_files(Utc::now()).unwrap();
    assert_eq!(deleted, 1);

    assert!(db.get_file("f1").unwrap().is_none());

    let msg = db.get_message("m1").unwrap().expect("message must survive");
    assert_eq!(msg.file_id, None);
}

#[test]
fn sweeps_are_idempotent() {
    let db = open_temp_db();

    db.insert_room(&room("r1", Duration::hours(-2))).unwrap();
    db.insert_file(&file("f1", "r1", Duration::hours(-1))).unwrap();

    assert_eq!(db.sweep_expired_files(Utc::now()).unwrap(), 1);
    assert_eq!(db.sweep_expired_rooms(Utc::now()).unwrap(), 1);

    // Second pass with no intervening writes: no deletions, no errors.
    assert_eq!(db.sweep_expired_files(Utc::now()).unwrap(), 0);
    assert_eq!(db.sweep_expired_rooms(Utc::now()).unwrap(), 0);
}

#[test]
fn unexpired_rows_survive_the_sweep() {
    let db = open_temp_db();

    db.insert_room(&room("keep", Duration::hours(1))).unwrap();
    db.insert_room(&room("drop", Duration::seconds(-1))).unwrap();
    db.insert_file(&file("f-keep", "keep", Duration::hours(24))).unwrap();

    assert_eq!(db.sweep_expired_rooms(Utc::now()).unwrap(), 1);

    assert!(db.get_room("keep").unwrap().is_some());
    assert!(db.get_file("f-keep").unwrap().is_some());
}

#[test]
fn file_expiry_is_independent_of_room_expiry() {
    let db = open_temp_db();

    // Room has 24h left; the file's own horizon already passed.
    db.insert_room(&room("r1", Duration::hours(24))).unwrap();
    db.insert_file(&file("early", "r1", Duration::hours(-1))).unwrap();
    db.insert_file(&file("late", "r1", Duration::hours(48))).unwrap();

    assert_eq!(db.sweep_expired_files(Utc::now()).unwrap(), 1);
    assert!(db.get_file("early").unwrap().is_none());
    assert!(db.get_file("late").unwrap().is_some());
}

#[test]
fn message_listings_are_newest_first() {
    let db = open_temp_db();
    db.insert_room(&room("r1", Duration::hours(1))).unwrap();

    let now = Utc::now();
    for (id, offset) in [("m-old", -10), ("m-new", -1)] {
        db.insert_message(&MessageRow {
            id: id.into(),
            room_id: "r1".into(),
            sender_name: "Ana".into(),
            content: id.into(),
            file_id: None,
            created_at: ts_to_sql(now + Duration::seconds(offset)),
        })
        .unwrap();
    }

    let messages = db.get_messages_by_room("r1").unwrap();
    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m-new", "m-old"]);
}
