//! Voice broadcast lifecycle over room state events
//!
//! Each user has at most one current `io.element.voice_broadcast_info`
//! state event per room, keyed by their user ID.

pub mod model;
pub mod usecase;

pub use usecase::{StartOutcome, UpdateOutcome, VoiceBroadcastUseCase};

pub const STATE_ROOM_VOICE_BROADCAST_INFO: &str = "io.element.voice_broadcast_info";
