use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Room time-to-live choices, kept as the string enum the clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomTtl {
    #[serde(rename = "1")]
    OneHour,
    #[serde(rename = "6")]
    SixHours,
    #[serde(rename = "12")]
    TwelveHours,
    #[serde(rename = "24")]
    OneDay,
}

impl RoomTtl {
    pub fn hours(self) -> i64 {
        match self {
            RoomTtl::OneHour => 1,
            RoomTtl::SixHours => 6,
            RoomTtl::TwelveHours => 12,
            RoomTtl::OneDay => 24,
        }
    }

    /// Expiry instant for a room created at `created_at`.
    /// Always strictly after `created_at`.
    pub fn expires_at(self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::hours(self.hours())
    }
}

/// External projection of a room. The password hash never leaves the server;
/// clients only learn whether one is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// File metadata record. The bytes themselves live at `storage_path` in the
/// object store; this service only tracks the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFile {
    pub id: String,
    pub room_id: String,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_path: String,
    pub encrypted_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    pub id: String,
    pub room_id: String,
    pub sender_name: String,
    pub content: String,
    pub file_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_parses_from_string_choices() {
        for (raw, hours) in [("1", 1), ("6", 6), ("12", 12), ("24", 24)] {
            let ttl: RoomTtl = serde_json::from_str(&format!("\"{}\"", raw)).unwrap();
            assert_eq!(ttl.hours(), hours);
        }
        assert!(serde_json::from_str::<RoomTtl>("\"2\"").is_err());
    }

    #[test]
    fn expiry_is_strictly_after_creation() {
        let t0 = Utc::now();
        let expires = RoomTtl::OneHour.expires_at(t0);
        assert_eq!(expires, t0 + Duration::hours(1));
        assert!(expires > t0);
    }
}
