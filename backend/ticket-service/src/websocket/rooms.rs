use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};

use super::message_types::{ChatBroadcast, ServerEvent};

/// Identifier of one realtime connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct Rooms {
    sessions: HashMap<SessionId, UnboundedSender<ServerEvent>>,
    members: HashMap<i64, HashSet<SessionId>>,
    /// Live events held back from a session until its history is sent
    held: HashMap<(SessionId, i64), Vec<ServerEvent>>,
}

/// Maps ticket ids to the live sessions subscribed to them.
///
/// One instance is built at startup and shared by clone.
#[derive(Default, Clone)]
pub struct RoomManager {
    inner: Arc<RwLock<Rooms>>,
    next_id: Arc<AtomicU64>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Events for it arrive on the returned receiver.
    pub async fn connect(&self) -> (SessionId, UnboundedReceiver<ServerEvent>) {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = unbounded_channel();
        self.inner.write().await.sessions.insert(id, tx);
        tracing::debug!(session_id = %id, "session connected");
        (id, rx)
    }

    /// Subscribe `session` to `ticket_id`. Rejects non-positive ids and
    /// unknown sessions.
    ///
    /// Broadcasts for the room are held for this session until
    /// [`finish_replay`](Self::finish_replay) or
    /// [`cancel_replay`](Self::cancel_replay) is called.
    pub async fn join(&self, session: SessionId, ticket_id: i64) -> bool {
        if ticket_id <= 0 {
            return false;
        }
        let mut guard = self.inner.write().await;
        if !guard.sessions.contains_key(&session) {
            return false;
        }
        guard.members.entry(ticket_id).or_default().insert(session);
        guard.held.entry((session, ticket_id)).or_default();
        tracing::debug!(session_id = %session, ticket_id, "session joined ticket");
        true
    }

    /// Send the replayed history, then release held events. Chat events
    /// already covered by the history (id not above its last id) are skipped.
    pub async fn finish_replay(
        &self,
        session: SessionId,
        ticket_id: i64,
        history: Vec<ChatBroadcast>,
    ) -> bool {
        let last_replayed = history.iter().map(|m| m.id).max();
        let mut guard = self.inner.write().await;
        let held = guard.held.remove(&(session, ticket_id)).unwrap_or_default();
        let Some(tx) = guard.sessions.get(&session) else {
            return false;
        };

        if tx.send(ServerEvent::History(history)).is_err() {
            return false;
        }
        for event in held {
            let replayed = match (&event, last_replayed) {
                (ServerEvent::Chat(msg), Some(last)) => msg.id <= last,
                _ => false,
            };
            if !replayed && tx.send(event).is_err() {
                return false;
            }
        }
        true
    }

    /// Release held events unfiltered, for when history could not be read.
    pub async fn cancel_replay(&self, session: SessionId, ticket_id: i64) {
        let mut guard = self.inner.write().await;
        let held = guard.held.remove(&(session, ticket_id)).unwrap_or_default();
        if let Some(tx) = guard.sessions.get(&session) {
            for event in held {
                if tx.send(event).is_err() {
                    break;
                }
            }
        }
    }

    /// Deliver `event` to every session currently in the room. Returns the
    /// number of sessions reached. Dead sessions are pruned.
    pub async fn broadcast(&self, ticket_id: i64, event: ServerEvent) -> usize {
        let mut guard = self.inner.write().await;
        let Rooms {
            sessions,
            members,
            held,
        } = &mut *guard;

        let Some(room) = members.get_mut(&ticket_id) else {
            return 0;
        };

        let mut dead = Vec::new();
        let mut delivered = 0;
        for session in room.iter() {
            if let Some(queue) = held.get_mut(&(*session, ticket_id)) {
                queue.push(event.clone());
                delivered += 1;
                continue;
            }
            match sessions.get(session) {
                Some(tx) if tx.send(event.clone()).is_ok() => delivered += 1,
                _ => dead.push(*session),
            }
        }

        for session in dead {
            room.remove(&session);
            sessions.remove(&session);
        }
        if room.is_empty() {
            members.remove(&ticket_id);
        }

        delivered
    }

    /// Send to one session only
    pub async fn send_to(&self, session: SessionId, event: ServerEvent) -> bool {
        let guard = self.inner.read().await;
        guard
            .sessions
            .get(&session)
            .map(|tx| tx.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Drop the session from every room. Safe to call more than once.
    pub async fn leave(&self, session: SessionId) {
        let mut guard = self.inner.write().await;
        let Rooms {
            sessions,
            members,
            held,
        } = &mut *guard;

        if sessions.remove(&session).is_none() {
            return;
        }
        held.retain(|(held_session, _), _| *held_session != session);
        members.retain(|_, room| {
            room.remove(&session);
            !room.is_empty()
        });
        tracing::debug!(session_id = %session, "session left");
    }

    pub async fn member_count(&self, ticket_id: i64) -> usize {
        let guard = self.inner.read().await;
        guard.members.get(&ticket_id).map(|r| r.len()).unwrap_or(0)
    }
}
