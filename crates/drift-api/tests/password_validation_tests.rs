/// Room password policy, including the stored-hash roundtrip through SQLite.

use chrono::{Duration, Utc};

use drift_api::password::hash_password;
use drift_api::rooms::check_room_password;
use drift_db::models::RoomRow;
use drift_db::{Database, ts_to_sql};

fn room_row(id: &str, password: Option<&str>) -> RoomRow {
    let now = Utc::now();
    RoomRow {
        id: id.into(),
        name: "drop zone".into(),
        password_hash: password.map(|p| hash_password(p).unwrap()),
        created_at: ts_to_sql(now),
        expires_at: ts_to_sql(now + Duration::hours(1)),
    }
}

#[test]
fn passwordless_room_accepts_any_input() {
    let row = room_row("r1", None);
    assert!(check_room_password(Some(&row), ""));
    assert!(check_room_password(Some(&row), "anything"));
}

#[test]
fn protected_room_accepts_only_the_exact_password() {
    let row = room_row("r1", Some("secret"));
    assert!(check_room_password(Some(&row), "secret"));
    assert!(!check_room_password(Some(&row), ""));
    assert!(!check_room_password(Some(&row), "SECRET"));
    assert!(!check_room_password(Some(&row), "secret "));
}

#[test]
fn unknown_room_fails_closed() {
    assert!(!check_room_password(None, ""));
    assert!(!check_room_password(None, "secret"));
}

#[test]
fn hash_survives_the_database_roundtrip() {
    let path = std::env::temp_dir().join(format!("drift_api_test_{}.db", uuid::Uuid::new_v4()));
    let db = Database::open(&path).unwrap();

    db.insert_room(&room_row("r1", Some("secret"))).unwrap();

    let stored = db.get_room("r1").unwrap().unwrap();
    assert!(stored.password_hash.is_some());
    assert!(check_room_password(Some(&stored), "secret"));
    assert!(!check_room_password(Some(&stored), "wrong"));

    let missing = db.get_room("ghost").unwrap();
    assert!(!check_room_password(missing.as_ref(), "secret"));
}
