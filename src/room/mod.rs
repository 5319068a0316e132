//! Room state events and the state service collaborator
//!
//! A room exposes an append-only log of typed state events keyed by
//! (event type, state key). The latest event per key is the current state.

pub mod homeserver;
#[cfg(test)]
pub mod memory;

pub use homeserver::HomeserverClient;
#[cfg(test)]
pub use memory::InMemoryStateStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_id!(
    /// Opaque room identifier, e.g. `!abc:example.org`
    RoomId
);
string_id!(
    /// Matrix user identifier, e.g. `@alice:example.org`
    UserId
);
string_id!(
    /// Event identifier assigned by the event store
    EventId
);

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Unknown room: {0}")]
    UnknownRoom(RoomId),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Homeserver returned {status} ({errcode}): {message}")]
    Api {
        status: u16,
        errcode: String,
        message: String,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Filter on the state key of a state event query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStringValue {
    IsNotEmpty,
    Equals(String),
}

impl QueryStringValue {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            QueryStringValue::IsNotEmpty => !value.is_empty(),
            QueryStringValue::Equals(expected) => expected == value,
        }
    }
}

/// A state event as seen by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub state_key: String,
    pub sender: UserId,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub origin_server_ts: i64,
}

/// Read and write access to a room's current state
///
/// Implementations return one entry per distinct state key, reflecting the
/// latest write, and fail explicitly on network or permission errors.
#[async_trait]
pub trait StateService: Send + Sync {
    /// Current state events of `event_type` whose state key passes `state_key`
    async fn get_state_events(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &QueryStringValue,
    ) -> Result<Vec<StateEvent>, StateError>;

    /// Current state event for exactly (`event_type`, `state_key`)
    async fn get_state_event(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
    ) -> Result<Option<StateEvent>, StateError> {
        let filter = QueryStringValue::Equals(state_key.to_string());
        let mut events = self.get_state_events(room_id, event_type, &filter).await?;
        Ok(events.pop())
    }

    /// Append a state event as the session's user, returning its event ID
    async fn send_state_event(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
        body: Value,
    ) -> Result<EventId, StateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_value() {
        assert!(!QueryStringValue::IsNotEmpty.matches(""));
        assert!(QueryStringValue::IsNotEmpty.matches("@a:hs"));
        assert!(QueryStringValue::Equals("@a:hs".into()).matches("@a:hs"));
        assert!(!QueryStringValue::Equals("@a:hs".into()).matches("@b:hs"));
    }

    #[test]
    fn test_state_event_wire_format() {
        let raw = serde_json::json!({
            "event_id": "$1",
            "type": "m.room.name",
            "state_key": "",
            "sender": "@a:hs",
            "content": { "name": "Lobby" },
            "origin_server_ts": 1700000000000i64,
            "unsigned": { "age": 12 }
        });
        let event: StateEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type, "m.room.name");
        assert_eq!(event.sender.as_str(), "@a:hs");
        assert_eq!(event.content["name"], "Lobby");
    }
}
