//! Command line surface: broadcast, features, recovery-key

pub mod broadcast;
pub mod features;
pub mod recovery;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "voice-broadcast", version, about = "Matrix voice broadcast and debug tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage your voice broadcast in a room
    Broadcast {
        #[command(subcommand)]
        action: BroadcastAction,
    },
    /// Inspect or override debug feature flags
    Features {
        #[command(subcommand)]
        action: FeaturesAction,
    },
    /// Check a secret storage recovery key
    RecoveryKey {
        /// Recovery key text; prompted on stdin when omitted
        key: Option<String>,
        /// Read the key from a file instead
        #[arg(long, conflicts_with = "key")]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum BroadcastAction {
    /// Start a broadcast unless one is already running in the room
    Start { room_id: String },
    Pause { room_id: String },
    Resume { room_id: String },
    Stop {
        room_id: String,
        /// Sequence number of the last chunk sent
        #[arg(long)]
        last_chunk_sequence: Option<u64>,
    },
    /// Show every user's current broadcast state
    Status { room_id: String },
}

#[derive(Debug, Subcommand)]
pub enum FeaturesAction {
    List,
    /// Override a feature with one of its options
    Set { key: String, option: String },
    /// Remove an override
    Reset { key: String },
}
