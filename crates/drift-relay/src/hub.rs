use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use drift_types::events::RelayEvent;

/// A typing indicator expires after this long without a refresh.
pub const TYPING_TTL: Duration = Duration::from_secs(3);

/// Outbound channel for one relay connection. The WebSocket writer task on
/// the other end drains it, so pushing here never blocks on a slow client.
pub type EventSender = mpsc::UnboundedSender<RelayEvent>;

/// Tracks all live relay connections, partitioned by room.
///
/// Each room's state sits behind its own mutex, so rooms mutate fully in
/// parallel. None of this is persisted — a restart starts empty and clients
/// resynchronize on reconnect.
#[derive(Clone)]
pub struct RoomHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    rooms: RwLock<HashMap<String, Arc<Mutex<RoomState>>>>,

    /// conn_id -> (room_id, user_id), so a closing transport can resolve
    /// which registration it owned without the caller supplying it.
    conn_index: RwLock<HashMap<Uuid, (String, String)>>,

    /// Stamps typing entries so a timer that lost a race to an explicit stop
    /// or refresh recognizes itself as stale.
    typing_generation: AtomicU64,

    typing_ttl: Duration,
}

#[derive(Default)]
struct RoomState {
    participants: HashMap<String, Participant>,
    typing: HashMap<String, TypingEntry>,
    /// Set when the last participant leaves and the state is dropped from the
    /// map; a join that raced the teardown retries against a fresh entry.
    closed: bool,
}

struct Participant {
    conn_id: Uuid,
    name: String,
    tx: EventSender,
}

struct TypingEntry {
    generation: u64,
    timer: JoinHandle<()>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::with_typing_ttl(TYPING_TTL)
    }

    pub fn with_typing_ttl(typing_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(HubInner {
                rooms: RwLock::new(HashMap::new()),
                conn_index: RwLock::new(HashMap::new()),
                typing_generation: AtomicU64::new(0),
                typing_ttl,
            }),
        }
    }

    /// Register a connection for (room, user). An existing registration for
    /// the same pair is superseded: its transport is not force-closed, it is
    /// simply no longer addressed. Broadcasts the new participant count to
    /// everyone in the room, the joiner included.
    pub async fn join(
        &self,
        room_id: &str,
        user_id: &str,
        user_name: &str,
        conn_id: Uuid,
        tx: EventSender,
    ) {
        let superseded = loop {
            let room = self.room_entry(room_id).await;
            let mut state = room.lock().await;
            if state.closed {
                continue;
            }

            let prev = state.participants.insert(
                user_id.to_string(),
                Participant {
                    conn_id,
                    name: user_name.to_string(),
                    tx: tx.clone(),
                },
            );
            broadcast_participant_count(&state, room_id);
            break prev.map(|p| p.conn_id);
        };

        let mut index = self.inner.conn_index.write().await;
        if let Some(old_conn) = superseded {
            index.remove(&old_conn);
        }
        index.insert(conn_id, (room_id.to_string(), user_id.to_string()));

        info!("{} ({}) joined room {}", user_name, user_id, room_id);
    }

    /// Remove a connection explicitly. A late leave from a superseded
    /// connection is a no-op: only the conn_id that owns the registration may
    /// remove it.
    pub async fn leave(&self, room_id: &str, user_id: &str, conn_id: Uuid) {
        if self.remove_participant(room_id, user_id, conn_id).await {
            self.inner.conn_index.write().await.remove(&conn_id);
            debug!("{} left room {}", user_id, room_id);
        }
    }

    /// Transport closed: resolve the owning (room, user) by lookup and leave.
    /// Unknown handles (never joined, or already superseded) are a no-op.
    pub async fn disconnect(&self, conn_id: Uuid) {
        let owned = self.inner.conn_index.write().await.remove(&conn_id);
        let Some((room_id, user_id)) = owned else {
            return;
        };
        self.remove_participant(&room_id, &user_id, conn_id).await;
        debug!("{} disconnected from room {}", user_id, room_id);
    }

    /// Distinct participants currently registered in the room.
    pub async fn participant_count(&self, room_id: &str) -> usize {
        match self.get_room(room_id).await {
            Some(room) => room.lock().await.participants.len(),
            None => 0,
        }
    }

    /// Mark a participant as typing, or slide the expiry window if they
    /// already are. Unknown participants (no live connection in the room)
    /// are ignored, so the typing set can never name someone absent from
    /// the registry.
    pub async fn typing_start(&self, room_id: &str, user_id: &str) {
        let Some(room) = self.get_room(room_id).await else {
            return;
        };
        let mut state = room.lock().await;
        if !state.participants.contains_key(user_id) {
            return;
        }

        let generation = self.inner.typing_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let refreshed = match state.typing.remove(user_id) {
            Some(prev) => {
                prev.timer.abort();
                true
            }
            None => false,
        };

        let timer = self.spawn_typing_timer(room_id, user_id, generation);
        state
            .typing
            .insert(user_id.to_string(), TypingEntry { generation, timer });

        // Only the idle -> typing transition is news to the room.
        if !refreshed {
            broadcast_typing_users(&state, room_id);
        }
    }

    /// Clear a typing indicator. Unknown room or participant is a no-op.
    pub async fn typing_stop(&self, room_id: &str, user_id: &str) {
        let Some(room) = self.get_room(room_id).await else {
            return;
        };
        let mut state = room.lock().await;
        if let Some(entry) = state.typing.remove(user_id) {
            entry.timer.abort();
            broadcast_typing_users(&state, room_id);
        }
    }

    /// Fan an event out to every connection in the room, optionally skipping
    /// one (the sender of a passthrough event). Delivery is best-effort: a
    /// connection whose writer has gone away is silently skipped.
    pub async fn broadcast(&self, room_id: &str, event: RelayEvent, exclude: Option<Uuid>) {
        let Some(room) = self.get_room(room_id).await else {
            return;
        };
        let state = room.lock().await;
        for participant in state.participants.values() {
            if Some(participant.conn_id) == exclude {
                continue;
            }
            let _ = participant.tx.send(event.clone());
        }
    }

    // -- internals --

    async fn room_entry(&self, room_id: &str) -> Arc<Mutex<RoomState>> {
        let mut rooms = self.inner.rooms.write().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(RoomState::default())))
            .clone()
    }

    async fn get_room(&self, room_id: &str) -> Option<Arc<Mutex<RoomState>>> {
        self.inner.rooms.read().await.get(room_id).cloned()
    }

    /// Remove (room, user) if `conn_id` still owns the registration.
    /// Broadcasts typing and presence updates, and tears the room state down
    /// when the last participant is gone. Returns whether a removal happened.
    async fn remove_participant(&self, room_id: &str, user_id: &str, conn_id: Uuid) -> bool {
        let Some(room) = self.get_room(room_id).await else {
            return false;
        };
        let mut state = room.lock().await;

        match state.participants.get(user_id) {
            Some(p) if p.conn_id == conn_id => {}
            _ => return false,
        }
        state.participants.remove(user_id);

        if let Some(entry) = state.typing.remove(user_id) {
            entry.timer.abort();
            broadcast_typing_users(&state, room_id);
        }

        if state.participants.is_empty() {
            for entry in state.typing.drain() {
                entry.1.timer.abort();
            }
            state.closed = true;
            // Safe to take the map lock here: no path holds it while waiting
            // on a room lock.
            self.inner.rooms.write().await.remove(room_id);
            debug!("room {} empty, state released", room_id);
        } else {
            broadcast_participant_count(&state, room_id);
        }
        true
    }

    fn spawn_typing_timer(&self, room_id: &str, user_id: &str, generation: u64) -> JoinHandle<()> {
        let hub = self.clone();
        let room_id = room_id.to_string();
        let user_id = user_id.to_string();
        let ttl = self.inner.typing_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            hub.expire_typing(&room_id, &user_id, generation).await;
        })
    }

    /// Timer path of the typing state machine: same effect as an explicit
    /// stop, unless an intervening stop/refresh made this timer stale.
    async fn expire_typing(&self, room_id: &str, user_id: &str, generation: u64) {
        let Some(room) = self.get_room(room_id).await else {
            return;
        };
        let mut state = room.lock().await;

        let current = match state.typing.get(user_id) {
            Some(entry) => entry.generation == generation,
            None => false,
        };
        if !current {
            return;
        }
        state.typing.remove(user_id);
        broadcast_typing_users(&state, room_id);
    }
}

fn broadcast_participant_count(state: &RoomState, room_id: &str) {
    let event = RelayEvent::ParticipantCount {
        room_id: room_id.to_string(),
        count: state.participants.len(),
    };
    for participant in state.participants.values() {
        let _ = participant.tx.send(event.clone());
    }
}

/// Typing set broadcast. Each recipient gets its own copy with its own name
/// filtered out, so a client never sees itself listed as typing.
fn broadcast_typing_users(state: &RoomState, room_id: &str) {
    for (recipient_id, recipient) in &state.participants {
        let users: Vec<String> = state
            .typing
            .keys()
            .filter(|typing_id| *typing_id != recipient_id)
            .filter_map(|typing_id| state.participants.get(typing_id))
            .map(|p| p.name.clone())
            .collect();

        let _ = recipient.tx.send(RelayEvent::TypingUsers {
            room_id: room_id.to_string(),
            users,
        });
    }
}
