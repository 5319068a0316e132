//! In-process room state store
//!
//! Keeps an append-only event log per room; the latest event per
//! (event type, state key) is the current state.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

use super::{EventId, QueryStringValue, RoomId, StateError, StateEvent, StateService, UserId};

/// State store backed by process memory
pub struct InMemoryStateStore {
    /// Session owner, used as sender of every write
    user_id: UserId,
    /// Per-room event logs in append order
    rooms: DashMap<RoomId, Vec<StateEvent>>,
    /// Writes issued through `send_state_event`
    sent: Mutex<Vec<(RoomId, StateEvent)>>,
    next_event: AtomicU64,
    read_only: AtomicBool,
}

impl InMemoryStateStore {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            rooms: DashMap::new(),
            sent: Mutex::new(Vec::new()),
            next_event: AtomicU64::new(1),
            read_only: AtomicBool::new(false),
        }
    }

    /// Register an empty room
    pub fn create_room(&self, room_id: RoomId) {
        self.rooms.entry(room_id).or_default();
    }

    /// Append an event from another sender, as if received through sync
    ///
    /// Not recorded as a write of this session.
    pub fn inject_state_event(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
        sender: UserId,
        content: Value,
    ) -> Result<EventId, StateError> {
        let event = self.build_event(event_type, state_key, sender, content);
        self.append(room_id, event.clone())?;
        Ok(event.event_id)
    }

    /// Reject every subsequent write with M_FORBIDDEN
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Writes issued by this session, oldest first
    pub fn sent_events(&self) -> Vec<(RoomId, StateEvent)> {
        self.sent.lock().clone()
    }

    fn build_event(
        &self,
        event_type: &str,
        state_key: &str,
        sender: UserId,
        content: Value,
    ) -> StateEvent {
        let n = self.next_event.fetch_add(1, Ordering::SeqCst);
        StateEvent {
            event_id: EventId::from(format!("$local{}", n)),
            event_type: event_type.to_string(),
            state_key: state_key.to_string(),
            sender,
            content,
            origin_server_ts: chrono::Utc::now().timestamp_millis(),
        }
    }

    fn append(&self, room_id: &RoomId, event: StateEvent) -> Result<(), StateError> {
        let mut log = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| StateError::UnknownRoom(room_id.clone()))?;
        log.push(event);
        Ok(())
    }
}

#[async_trait]
impl StateService for InMemoryStateStore {
    async fn get_state_events(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &QueryStringValue,
    ) -> Result<Vec<StateEvent>, StateError> {
        let log = self
            .rooms
            .get(room_id)
            .ok_or_else(|| StateError::UnknownRoom(room_id.clone()))?;

        // Walk newest first so the first hit per key is the current one
        let mut seen = HashSet::new();
        let mut current: Vec<StateEvent> = log
            .iter()
            .rev()
            .filter(|e| e.event_type == event_type)
            .filter(|e| seen.insert(e.state_key.clone()))
            .filter(|e| state_key.matches(&e.state_key))
            .cloned()
            .collect();
        current.reverse();
        Ok(current)
    }

    async fn send_state_event(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
        body: Value,
    ) -> Result<EventId, StateError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StateError::Api {
                status: 403,
                errcode: "M_FORBIDDEN".to_string(),
                message: "You don't have permission to post that to the room".to_string(),
            });
        }

        let event = self.build_event(event_type, state_key, self.user_id.clone(), body);
        self.append(room_id, event.clone())?;
        debug!("[{}] Stored {} for {:?} as {}", room_id, event_type, state_key, event.event_id);

        let event_id = event.event_id.clone();
        self.sent.lock().push((room_id.clone(), event));
        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (InMemoryStateStore, RoomId) {
        let store = InMemoryStateStore::new(UserId::from("@me:hs"));
        let room = RoomId::from("!room:hs");
        store.create_room(room.clone());
        (store, room)
    }

    #[tokio::test]
    async fn test_latest_event_per_key_wins() {
        let (store, room) = store();
        store
            .inject_state_event(&room, "t", "@a:hs", "@a:hs".into(), json!({"v": 1}))
            .unwrap();
        store
            .inject_state_event(&room, "t", "@b:hs", "@b:hs".into(), json!({"v": 2}))
            .unwrap();
        store
            .inject_state_event(&room, "t", "@a:hs", "@a:hs".into(), json!({"v": 3}))
            .unwrap();
        store
            .inject_state_event(&room, "other", "@a:hs", "@a:hs".into(), json!({}))
            .unwrap();

        let events = store
            .get_state_events(&room, "t", &QueryStringValue::IsNotEmpty)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        let a = events.iter().find(|e| e.state_key == "@a:hs").unwrap();
        assert_eq!(a.content["v"], 3);

        let b = store.get_state_event(&room, "t", "@b:hs").await.unwrap().unwrap();
        assert_eq!(b.content["v"], 2);
        assert!(store.get_state_event(&room, "t", "@c:hs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_state_key_filtered() {
        let (store, room) = store();
        store
            .inject_state_event(&room, "t", "", "@a:hs".into(), json!({}))
            .unwrap();
        let events = store
            .get_state_events(&room, "t", &QueryStringValue::IsNotEmpty)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_send_records_write_and_sender() {
        let (store, room) = store();
        let event_id = store
            .send_state_event(&room, "t", "@me:hs", json!({"state": "started"}))
            .await
            .unwrap();

        let sent = store.sent_events();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.event_id, event_id);
        assert_eq!(sent[0].1.sender.as_str(), "@me:hs");
    }

    #[tokio::test]
    async fn test_unknown_room_and_read_only() {
        let (store, room) = store();
        let missing = RoomId::from("!missing:hs");
        let err = store
            .get_state_events(&missing, "t", &QueryStringValue::IsNotEmpty)
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::UnknownRoom(_)));

        store.set_read_only(true);
        let err = store
            .send_state_event(&room, "t", "@me:hs", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::Api { status: 403, .. }));
        assert!(store.sent_events().is_empty());
    }
}
