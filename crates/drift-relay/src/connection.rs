use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use drift_types::events::{RelayCommand, RelayEvent};

use crate::hub::{EventSender, RoomHub};

/// Drive a single relay WebSocket until either side closes it.
///
/// The socket is split: a writer task drains this connection's outbound
/// channel so one slow client never stalls delivery to others, while this
/// task reads commands. A frame that fails to parse is logged and dropped;
/// the connection stays open.
pub async fn handle_socket(socket: WebSocket, hub: RoomHub) {
    let conn_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelayEvent>();
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!("conn {} failed to encode event: {}", conn_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let hub_recv = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<RelayCommand>(&text) {
                    Ok(cmd) => handle_command(&hub_recv, conn_id, &tx, cmd).await,
                    Err(e) => {
                        let preview: String = text.chars().take(200).collect();
                        warn!("conn {} bad frame: {} -- raw: {}", conn_id, e, preview);
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Whichever side finishes first tears the other down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.disconnect(conn_id).await;
}

async fn handle_command(hub: &RoomHub, conn_id: Uuid, tx: &EventSender, cmd: RelayCommand) {
    match cmd {
        RelayCommand::JoinRoom {
            room_id,
            user_id,
            user_name,
        } => {
            hub.join(&room_id, &user_id, &user_name, conn_id, tx.clone())
                .await;
        }

        RelayCommand::LeaveRoom { room_id, user_id } => {
            hub.leave(&room_id, &user_id, conn_id).await;
        }

        RelayCommand::TypingStart { room_id, user_id } => {
            hub.typing_start(&room_id, &user_id).await;
        }

        RelayCommand::TypingStop { room_id, user_id } => {
            hub.typing_stop(&room_id, &user_id).await;
        }

        // Passthrough: the payload was already persisted via the REST layer;
        // the relay just fans it out to everyone else in the room.
        RelayCommand::NewMessage { room_id, message } => {
            let event = RelayEvent::NewMessage {
                room_id: room_id.clone(),
                message,
            };
            hub.broadcast(&room_id, event, Some(conn_id)).await;
        }

        RelayCommand::FileUploaded { room_id, file } => {
            let event = RelayEvent::FileUploaded {
                room_id: room_id.clone(),
                file,
            };
            hub.broadcast(&room_id, event, Some(conn_id)).await;
        }
    }
}
