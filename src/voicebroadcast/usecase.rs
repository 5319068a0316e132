//! Start, pause, resume and stop a voice broadcast

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::model::{RelatesTo, VoiceBroadcastInfoContent, VoiceBroadcastRecord, VoiceBroadcastState};
use super::STATE_ROOM_VOICE_BROADCAST_INFO;
use crate::room::{EventId, QueryStringValue, RoomId, StateError, StateService, UserId};

#[derive(Error, Debug)]
pub enum VoiceBroadcastError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("Failed to encode voice broadcast content: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of asking to start a broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { event_id: EventId },
    /// Someone in the room still has a broadcast that is not stopped
    NotStarted { ongoing: Vec<UserId> },
}

/// Result of pausing, resuming or stopping the session user's broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Sent {
        event_id: EventId,
        state: VoiceBroadcastState,
    },
    /// The current state does not allow the transition; nothing was written
    Skipped { current: Option<VoiceBroadcastState> },
}

/// Voice broadcast operations for one session user
pub struct VoiceBroadcastUseCase {
    state: Arc<dyn StateService>,
    my_user_id: UserId,
    device_id: Option<String>,
    chunk_length: u64,
    /// Serializes starts per room within this process
    room_locks: DashMap<RoomId, Arc<Mutex<()>>>,
}

impl VoiceBroadcastUseCase {
    pub fn new(
        state: Arc<dyn StateService>,
        my_user_id: UserId,
        device_id: Option<String>,
        chunk_length: u64,
    ) -> Self {
        Self {
            state,
            my_user_id,
            device_id,
            chunk_length,
            room_locks: DashMap::new(),
        }
    }

    /// Current voice broadcast records of every user in the room
    pub async fn records(&self, room_id: &RoomId) -> Result<Vec<VoiceBroadcastRecord>, StateError> {
        let events = self
            .state
            .get_state_events(room_id, STATE_ROOM_VOICE_BROADCAST_INFO, &QueryStringValue::IsNotEmpty)
            .await?;
        Ok(events.iter().map(VoiceBroadcastRecord::from_event).collect())
    }

    /// Start a broadcast unless any user in the room has one that is not stopped
    pub async fn try_start(&self, room_id: &RoomId) -> Result<StartOutcome, VoiceBroadcastError> {
        let lock = self.room_locks.entry(room_id.clone()).or_default().clone();
        let outcome = {
            let _guard = lock.lock().await;
            self.start_locked(room_id).await
        };

        // Only the map and this call still hold the lock: nobody is waiting on it
        self.room_locks
            .remove_if(room_id, |_, l| Arc::ptr_eq(l, &lock) && Arc::strong_count(l) == 2);
        outcome
    }

    async fn start_locked(&self, room_id: &RoomId) -> Result<StartOutcome, VoiceBroadcastError> {
        let ongoing: Vec<UserId> = self
            .records(room_id)
            .await?
            .into_iter()
            .filter(|r| r.is_ongoing())
            .map(|r| r.user_id)
            .collect();

        if !ongoing.is_empty() {
            debug!(
                "[{}] Cannot start voice broadcast, ongoing for {:?}",
                room_id, ongoing
            );
            return Ok(StartOutcome::NotStarted { ongoing });
        }

        let mut content = VoiceBroadcastInfoContent::new(VoiceBroadcastState::Started);
        content.chunk_length = Some(self.chunk_length);
        content.device_id = self.device_id.clone();

        let event_id = self.send(room_id, &content).await?;
        info!("[{}] Voice broadcast started by {} ({})", room_id, self.my_user_id, event_id);
        Ok(StartOutcome::Started { event_id })
    }

    /// STARTED or RESUMED -> PAUSED
    pub async fn pause(&self, room_id: &RoomId) -> Result<UpdateOutcome, VoiceBroadcastError> {
        self.transition(
            room_id,
            &[VoiceBroadcastState::Started, VoiceBroadcastState::Resumed],
            VoiceBroadcastState::Paused,
            None,
        )
        .await
    }

    /// PAUSED -> RESUMED
    pub async fn resume(&self, room_id: &RoomId) -> Result<UpdateOutcome, VoiceBroadcastError> {
        self.transition(
            room_id,
            &[VoiceBroadcastState::Paused],
            VoiceBroadcastState::Resumed,
            None,
        )
        .await
    }

    /// Any non-stopped state -> STOPPED
    pub async fn stop(
        &self,
        room_id: &RoomId,
        last_chunk_sequence: Option<u64>,
    ) -> Result<UpdateOutcome, VoiceBroadcastError> {
        self.transition(
            room_id,
            &[
                VoiceBroadcastState::Started,
                VoiceBroadcastState::Paused,
                VoiceBroadcastState::Resumed,
            ],
            VoiceBroadcastState::Stopped,
            last_chunk_sequence,
        )
        .await
    }

    async fn transition(
        &self,
        room_id: &RoomId,
        allowed_from: &[VoiceBroadcastState],
        next: VoiceBroadcastState,
        last_chunk_sequence: Option<u64>,
    ) -> Result<UpdateOutcome, VoiceBroadcastError> {
        let record = self
            .state
            .get_state_event(room_id, STATE_ROOM_VOICE_BROADCAST_INFO, self.my_user_id.as_str())
            .await?
            .map(|e| VoiceBroadcastRecord::from_event(&e));

        let current = record.as_ref().and_then(|r| r.state());
        let started = record.as_ref().and_then(|r| r.started_event_id());

        let (Some(from), Some(started)) = (current, started) else {
            debug!("[{}] No voice broadcast of {} to move to {}", room_id, self.my_user_id, next);
            return Ok(UpdateOutcome::Skipped { current });
        };
        if !allowed_from.contains(&from) {
            debug!("[{}] Voice broadcast cannot go from {} to {}", room_id, from, next);
            return Ok(UpdateOutcome::Skipped { current });
        }

        let mut content = VoiceBroadcastInfoContent::new(next);
        content.device_id = self.device_id.clone();
        content.last_chunk_sequence = last_chunk_sequence;
        content.relates_to = Some(RelatesTo::reference(started));

        let event_id = self.send(room_id, &content).await?;
        info!("[{}] Voice broadcast {} -> {} ({})", room_id, from, next, event_id);
        Ok(UpdateOutcome::Sent {
            event_id,
            state: next,
        })
    }

    async fn send(
        &self,
        room_id: &RoomId,
        content: &VoiceBroadcastInfoContent,
    ) -> Result<EventId, VoiceBroadcastError> {
        let body = content.to_body()?;
        self.state
            .send_state_event(
                room_id,
                STATE_ROOM_VOICE_BROADCAST_INFO,
                self.my_user_id.as_str(),
                body,
            )
            .await
            .map_err(|e| {
                warn!("[{}] Failed to send voice broadcast info: {}", room_id, e);
                e.into()
            })
    }
}
