use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Commands sent FROM client TO server over the relay WebSocket.
///
/// `new_message` and `file_uploaded` are passthrough: the server rebroadcasts
/// the payload to the rest of the room without inspecting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayCommand {
    /// Join a room (supersedes any prior connection for the same user)
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        user_id: String,
        user_name: String,
    },

    /// Leave a room explicitly
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String, user_id: String },

    /// Start (or refresh) the typing indicator
    #[serde(rename_all = "camelCase")]
    TypingStart { room_id: String, user_id: String },

    /// Clear the typing indicator
    #[serde(rename_all = "camelCase")]
    TypingStop { room_id: String, user_id: String },

    /// A chat message was posted; relay to everyone else in the room
    #[serde(rename_all = "camelCase")]
    NewMessage { room_id: String, message: Value },

    /// A file finished uploading; relay to everyone else in the room
    #[serde(rename_all = "camelCase")]
    FileUploaded { room_id: String, file: Value },
}

/// Events sent FROM server TO clients over the relay WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// Live participant count for a room, sent on every join/leave
    #[serde(rename_all = "camelCase")]
    ParticipantCount { room_id: String, count: usize },

    /// Display names currently typing. The recipient's own name is excluded
    /// server-side, so each connection gets its own copy.
    #[serde(rename_all = "camelCase")]
    TypingUsers { room_id: String, users: Vec<String> },

    #[serde(rename_all = "camelCase")]
    NewMessage { room_id: String, message: Value },

    #[serde(rename_all = "camelCase")]
    FileUploaded { room_id: String, file: Value },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_room_wire_format() {
        let cmd: RelayCommand = serde_json::from_str(
            r#"{"type":"join_room","roomId":"r1","userId":"u1","userName":"Ana"}"#,
        )
        .unwrap();
        match cmd {
            RelayCommand::JoinRoom {
                room_id,
                user_id,
                user_name,
            } => {
                assert_eq!(room_id, "r1");
                assert_eq!(user_id, "u1");
                assert_eq!(user_name, "Ana");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn typing_start_ignores_extra_fields() {
        // Older clients also send userName on typing_start; the server only
        // needs the pair.
        let cmd: RelayCommand = serde_json::from_str(
            r#"{"type":"typing_start","roomId":"r1","userId":"u1","userName":"Ana"}"#,
        )
        .unwrap();
        assert!(matches!(cmd, RelayCommand::TypingStart { .. }));
    }

    #[test]
    fn participant_count_serializes_camel_case() {
        let event = RelayEvent::ParticipantCount {
            room_id: "r1".into(),
            count: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"participant_count","roomId":"r1","count":3}"#
        );
    }
}
