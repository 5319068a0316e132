//! voice-broadcast
//!
//! Matrix client tooling for voice broadcasts: starts, pauses, resumes and
//! stops a user's broadcast through room state events, with debug feature
//! flags and secret storage recovery key checks.

mod commands;
mod config;
mod database;
mod features;
mod recovery;
mod room;
mod voicebroadcast;

use clap::Parser;
use commands::{Cli, Command};
use config::Config;
use database::Database;
use features::DebugFeatures;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,voice_broadcast=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Please check HOMESERVER_URL, ACCESS_TOKEN and USER_ID in .env file");
            std::process::exit(1);
        }
    };

    let db = match Database::open(&config.features_db) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open feature database {:?}: {}", config.features_db, e);
            std::process::exit(1);
        }
    };
    let features = DebugFeatures::new(db);

    let result: Result<(), Box<dyn std::error::Error + Send + Sync>> = match cli.command {
        Command::Broadcast { action } => {
            commands::broadcast::handle(action, &config, &features).await
        }
        Command::Features { action } => {
            commands::features::handle(action, &features).map_err(Into::into)
        }
        Command::RecoveryKey { key, file } => {
            commands::recovery::handle(key, file).map_err(Into::into)
        }
    };

    match result {
        Ok(()) => info!("Done"),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
