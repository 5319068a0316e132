//! Voice broadcast info event content

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::room::{EventId, StateEvent, UserId};

pub const REL_TYPE_REFERENCE: &str = "m.reference";

/// Lifecycle state of a user's voice broadcast in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceBroadcastState {
    Started,
    Paused,
    Resumed,
    Stopped,
}

impl VoiceBroadcastState {
    #[cfg(test)]
    pub const ALL: [VoiceBroadcastState; 4] = [
        VoiceBroadcastState::Started,
        VoiceBroadcastState::Paused,
        VoiceBroadcastState::Resumed,
        VoiceBroadcastState::Stopped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceBroadcastState::Started => "started",
            VoiceBroadcastState::Paused => "paused",
            VoiceBroadcastState::Resumed => "resumed",
            VoiceBroadcastState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for VoiceBroadcastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `m.relates_to` pointing back at the STARTED event of a broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatesTo {
    pub rel_type: String,
    pub event_id: EventId,
}

impl RelatesTo {
    pub fn reference(event_id: EventId) -> Self {
        Self {
            rel_type: REL_TYPE_REFERENCE.to_string(),
            event_id,
        }
    }
}

/// Content of an `io.element.voice_broadcast_info` state event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceBroadcastInfoContent {
    pub state: VoiceBroadcastState,
    /// Length of each recorded chunk, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_chunk_sequence: Option<u64>,
    #[serde(rename = "m.relates_to", default, skip_serializing_if = "Option::is_none")]
    pub relates_to: Option<RelatesTo>,
}

impl VoiceBroadcastInfoContent {
    pub fn new(state: VoiceBroadcastState) -> Self {
        Self {
            state,
            chunk_length: None,
            device_id: None,
            last_chunk_sequence: None,
            relates_to: None,
        }
    }

    pub fn to_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// One user's current voice broadcast record in a room
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceBroadcastRecord {
    pub user_id: UserId,
    pub event_id: EventId,
    /// None when the content could not be understood
    pub content: Option<VoiceBroadcastInfoContent>,
    /// When the homeserver received the current event
    pub timestamp: Option<DateTime<Utc>>,
}

impl VoiceBroadcastRecord {
    pub fn from_event(event: &StateEvent) -> Self {
        Self {
            user_id: UserId::from(event.state_key.as_str()),
            event_id: event.event_id.clone(),
            content: serde_json::from_value(event.content.clone()).ok(),
            timestamp: DateTime::from_timestamp_millis(event.origin_server_ts)
                .filter(|_| event.origin_server_ts > 0),
        }
    }

    pub fn state(&self) -> Option<VoiceBroadcastState> {
        self.content.as_ref().map(|c| c.state)
    }

    /// A record blocks new broadcasts unless it is known to be STOPPED
    pub fn is_ongoing(&self) -> bool {
        self.state() != Some(VoiceBroadcastState::Stopped)
    }

    /// Event ID of the STARTED event this broadcast hangs off
    pub fn started_event_id(&self) -> Option<EventId> {
        let content = self.content.as_ref()?;
        match content.state {
            VoiceBroadcastState::Started => Some(self.event_id.clone()),
            _ => content.relates_to.as_ref().map(|r| r.event_id.clone()),
        }
    }
}
