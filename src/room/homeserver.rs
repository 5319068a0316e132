//! Matrix client-server API state service
//!
//! Reads and writes room state through a homeserver over HTTPS

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{EventId, QueryStringValue, RoomId, StateError, StateEvent, StateService};
use crate::config::HomeserverConfig;

const CLIENT_API_PREFIX: [&str; 4] = ["_matrix", "client", "v3", "rooms"];

/// Response to a state event PUT
#[derive(Debug, Deserialize)]
struct SendStateResponse {
    event_id: EventId,
}

/// Standard Matrix error body
#[derive(Debug, Deserialize)]
struct MatrixError {
    #[serde(default)]
    errcode: String,
    #[serde(default)]
    error: String,
}

/// Homeserver-backed state service for one logged-in session
pub struct HomeserverClient {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl HomeserverClient {
    /// Create a new client for the given session
    pub fn new(config: &HomeserverConfig) -> Result<Self, StateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// `/_matrix/client/v3/rooms/{roomId}/state[/{eventType}/{stateKey}]`
    ///
    /// Each segment is percent-encoded, so `!room:hs` and empty state keys are safe.
    fn state_url(&self, room_id: &RoomId, tail: &[&str]) -> Result<Url, StateError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StateError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(CLIENT_API_PREFIX);
            segments.push(room_id.as_str());
            segments.push("state");
            segments.extend(tail);
        }
        Ok(url)
    }

    async fn check(room_id: &RoomId, response: Response) -> Result<Response, StateError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_else(|e| {
            warn!("[{}] Failed to read error body ({}): {}", room_id, status, e);
            String::new()
        });
        let body: MatrixError = serde_json::from_str(&text).unwrap_or(MatrixError {
            errcode: "M_UNKNOWN".to_string(),
            error: text,
        });
        error!("[{}] Homeserver request failed: {} {}", room_id, status, body.errcode);

        if status == StatusCode::NOT_FOUND && body.errcode == "M_NOT_FOUND" {
            return Err(StateError::UnknownRoom(room_id.clone()));
        }

        Err(StateError::Api {
            status: status.as_u16(),
            errcode: body.errcode,
            message: body.error,
        })
    }
}

#[async_trait]
impl StateService for HomeserverClient {
    async fn get_state_events(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &QueryStringValue,
    ) -> Result<Vec<StateEvent>, StateError> {
        let url = self.state_url(room_id, &[])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        // The full state endpoint already yields one event per (type, key)
        let all: Vec<StateEvent> = Self::check(room_id, response).await?.json().await?;
        let events: Vec<StateEvent> = all
            .into_iter()
            .filter(|e| e.event_type == event_type && state_key.matches(&e.state_key))
            .collect();

        debug!("[{}] {} current {} events", room_id, events.len(), event_type);
        Ok(events)
    }

    async fn send_state_event(
        &self,
        room_id: &RoomId,
        event_type: &str,
        state_key: &str,
        body: Value,
    ) -> Result<EventId, StateError> {
        let url = self.state_url(room_id, &[event_type, state_key])?;
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let sent: SendStateResponse = Self::check(room_id, response).await?.json().await?;
        info!("[{}] Sent {} as {}", room_id, event_type, sent.event_id);
        Ok(sent.event_id)
    }
}
