//! Broadcast commands: start, pause, resume, stop, status

use std::sync::Arc;
use tracing::info;

use super::BroadcastAction;
use crate::config::Config;
use crate::features::{DebugFeatures, VoiceBroadcastFeature};
use crate::room::{HomeserverClient, RoomId};
use crate::voicebroadcast::{StartOutcome, UpdateOutcome, VoiceBroadcastUseCase};

/// Handle `broadcast <action>`
pub async fn handle(
    action: BroadcastAction,
    config: &Config,
    features: &DebugFeatures,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let homeserver = config.require_homeserver()?;
    let client = Arc::new(HomeserverClient::new(homeserver)?);
    let usecase = VoiceBroadcastUseCase::new(
        client,
        homeserver.user_id.clone(),
        homeserver.device_id.clone(),
        config.chunk_length,
    );

    match action {
        BroadcastAction::Start { room_id } => {
            if features.voice_broadcast()? == VoiceBroadcastFeature::Disabled {
                println!("Voice broadcast is disabled (features set voice_broadcast enabled)");
                return Ok(());
            }
            let room_id = RoomId::from(room_id);
            match usecase.try_start(&room_id).await? {
                StartOutcome::Started { event_id } => {
                    println!("Voice broadcast started ({})", event_id);
                }
                StartOutcome::NotStarted { ongoing } => {
                    let users: Vec<String> = ongoing.iter().map(|u| u.to_string()).collect();
                    println!("Cannot start: broadcast in progress for {}", users.join(", "));
                }
            }
        }
        BroadcastAction::Pause { room_id } => {
            report(usecase.pause(&RoomId::from(room_id)).await?);
        }
        BroadcastAction::Resume { room_id } => {
            report(usecase.resume(&RoomId::from(room_id)).await?);
        }
        BroadcastAction::Stop {
            room_id,
            last_chunk_sequence,
        } => {
            report(usecase.stop(&RoomId::from(room_id), last_chunk_sequence).await?);
        }
        BroadcastAction::Status { room_id } => {
            let room_id = RoomId::from(room_id);
            let records = usecase.records(&room_id).await?;
            info!("[{}] {} voice broadcast records", room_id, records.len());
            if records.is_empty() {
                println!("No voice broadcasts in {}", room_id);
            }
            for record in records {
                let state = record
                    .state()
                    .map(|s| s.as_str())
                    .unwrap_or("unknown");
                let since = record
                    .timestamp
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}\t{}", record.user_id, state, since, record.event_id);
            }
        }
    }

    Ok(())
}

fn report(outcome: UpdateOutcome) {
    match outcome {
        UpdateOutcome::Sent { event_id, state } => {
            println!("Voice broadcast {} ({})", state, event_id);
        }
        UpdateOutcome::Skipped { current: Some(state) } => {
            println!("Nothing to do: your broadcast is {}", state);
        }
        UpdateOutcome::Skipped { current: None } => {
            println!("Nothing to do: you have no voice broadcast in this room");
        }
    }
}
