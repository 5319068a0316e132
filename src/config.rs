//! Configuration management for voice-broadcast
//!
//! Loads settings from environment variables (.env file)

use reqwest::Url;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::room::UserId;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Homeserver session settings
#[derive(Debug, Clone)]
pub struct HomeserverConfig {
    /// Base URL of the homeserver, e.g. https://matrix.example.org
    pub base_url: Url,
    /// Access token of the logged-in session
    pub access_token: String,
    /// Matrix user ID of the session owner
    pub user_id: UserId,
    /// Device ID, advertised in voice broadcast info events
    pub device_id: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Homeserver session, absent when HOMESERVER_URL is unset
    pub homeserver: Option<HomeserverConfig>,
    /// SQLite file holding debug feature overrides
    pub features_db: PathBuf,
    /// Voice broadcast chunk length in seconds
    pub chunk_length: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let homeserver = match lookup("HOMESERVER_URL").filter(|s| !s.is_empty()) {
            Some(raw) => {
                let base_url = Url::parse(&raw)
                    .map_err(|_| ConfigError::InvalidValue("HOMESERVER_URL".to_string(), raw))?;

                let access_token = lookup("ACCESS_TOKEN")
                    .ok_or_else(|| ConfigError::MissingEnvVar("ACCESS_TOKEN".to_string()))?;

                let user_id = lookup("USER_ID")
                    .ok_or_else(|| ConfigError::MissingEnvVar("USER_ID".to_string()))?;
                if !user_id.starts_with('@') || !user_id.contains(':') {
                    return Err(ConfigError::InvalidValue("USER_ID".to_string(), user_id));
                }

                Some(HomeserverConfig {
                    base_url,
                    access_token,
                    user_id: UserId::from(user_id),
                    device_id: lookup("DEVICE_ID").filter(|s| !s.is_empty()),
                })
            }
            None => None,
        };

        let features_db = lookup("FEATURES_DB")
            .unwrap_or_else(|| "debug_features.db".to_string())
            .into();

        let chunk_length = lookup("VOICE_BROADCAST_CHUNK_LENGTH")
            .map(|s| {
                s.parse::<u64>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| {
                        ConfigError::InvalidValue("VOICE_BROADCAST_CHUNK_LENGTH".to_string(), s)
                    })
            })
            .transpose()?
            .unwrap_or(defaults::CHUNK_LENGTH_SECS);

        Ok(Self {
            homeserver,
            features_db,
            chunk_length,
        })
    }

    /// Homeserver settings, or an error naming the first missing variable
    pub fn require_homeserver(&self) -> Result<&HomeserverConfig, ConfigError> {
        self.homeserver
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("HOMESERVER_URL".to_string()))
    }
}

pub mod defaults {
    pub const CHUNK_LENGTH_SECS: u64 = 120;
}
