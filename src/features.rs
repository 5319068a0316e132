//! Feature flags with debug overrides
//!
//! Defaults are compiled in; overrides are set from the debug settings
//! listing and persisted in SQLite.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::{Database, DatabaseError};

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
    #[error("Invalid option '{option}' for {feature}, expected one of: {expected}")]
    UnknownOption {
        feature: String,
        option: String,
        expected: String,
    },
}

/// A feature whose value is one of a closed set of options
pub trait EnumFeature: Copy + PartialEq + Sized + 'static {
    const KEY: &'static str;
    const LABEL: &'static str;
    const DEFAULT: Self;

    fn options() -> &'static [Self];
    fn as_str(&self) -> &'static str;

    fn parse(s: &str) -> Option<Self> {
        Self::options()
            .iter()
            .copied()
            .find(|o| o.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginVersion {
    V1,
    V2,
}

impl EnumFeature for LoginVersion {
    const KEY: &'static str = "login_version";
    const LABEL: &'static str = "Login version";
    const DEFAULT: Self = LoginVersion::V1;

    fn options() -> &'static [Self] {
        &[LoginVersion::V1, LoginVersion::V2]
    }

    fn as_str(&self) -> &'static str {
        match self {
            LoginVersion::V1 => "v1",
            LoginVersion::V2 => "v2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceBroadcastFeature {
    Disabled,
    Enabled,
}

impl EnumFeature for VoiceBroadcastFeature {
    const KEY: &'static str = "voice_broadcast";
    const LABEL: &'static str = "Voice broadcast";
    const DEFAULT: Self = VoiceBroadcastFeature::Enabled;

    fn options() -> &'static [Self] {
        &[VoiceBroadcastFeature::Disabled, VoiceBroadcastFeature::Enabled]
    }

    fn as_str(&self) -> &'static str {
        match self {
            VoiceBroadcastFeature::Disabled => "disabled",
            VoiceBroadcastFeature::Enabled => "enabled",
        }
    }
}

/// Compiled-in feature values
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFeatures;

impl DefaultFeatures {
    pub fn get<T: EnumFeature>(&self) -> T {
        T::DEFAULT
    }
}

/// One row of the debug settings listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureItem {
    pub key: &'static str,
    pub label: &'static str,
    /// Only set when an override is stored
    pub selection: Option<&'static str>,
    pub default: &'static str,
    pub options: Vec<&'static str>,
}

/// Feature values with persisted debug overrides on top of the defaults
pub struct DebugFeatures {
    db: Arc<Database>,
    defaults: DefaultFeatures,
}

impl DebugFeatures {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            defaults: DefaultFeatures,
        }
    }

    fn stored<T: EnumFeature>(&self) -> Result<Option<T>, FeatureError> {
        let Some(raw) = self.db.get_override(T::KEY)? else {
            return Ok(None);
        };
        let parsed = T::parse(&raw);
        if parsed.is_none() {
            warn!("Ignoring unknown override '{}' for {}", raw, T::KEY);
        }
        Ok(parsed)
    }

    pub fn has_enum_override<T: EnumFeature>(&self) -> Result<bool, FeatureError> {
        Ok(self.stored::<T>()?.is_some())
    }

    /// The override if one is stored, otherwise the default
    pub fn selection<T: EnumFeature>(&self) -> Result<T, FeatureError> {
        Ok(self.stored::<T>()?.unwrap_or_else(|| self.defaults.get()))
    }

    /// Store `option` as the override, or clear it with `None`
    pub fn override_enum<T: EnumFeature>(&self, option: Option<T>) -> Result<(), FeatureError> {
        match option {
            Some(value) => {
                self.db.set_override(T::KEY, value.as_str())?;
                info!("Feature {} overridden to {}", T::KEY, value.as_str());
            }
            None => {
                self.db.clear_override(T::KEY)?;
                info!("Feature {} reset to default", T::KEY);
            }
        }
        Ok(())
    }

    pub fn voice_broadcast(&self) -> Result<VoiceBroadcastFeature, FeatureError> {
        self.selection()
    }

    fn item<T: EnumFeature>(&self) -> Result<FeatureItem, FeatureError> {
        let selection = if self.has_enum_override::<T>()? {
            Some(self.selection::<T>()?.as_str())
        } else {
            None
        };
        Ok(FeatureItem {
            key: T::KEY,
            label: T::LABEL,
            selection,
            default: self.defaults.get::<T>().as_str(),
            options: T::options().iter().map(|o| o.as_str()).collect(),
        })
    }

    /// Rows for the debug settings screen
    pub fn feature_items(&self) -> Result<Vec<FeatureItem>, FeatureError> {
        Ok(vec![
            self.item::<LoginVersion>()?,
            self.item::<VoiceBroadcastFeature>()?,
        ])
    }

    /// Override a feature by key; `None` restores the default
    pub fn override_by_key(&self, key: &str, option: Option<&str>) -> Result<(), FeatureError> {
        if key == LoginVersion::KEY {
            self.override_raw::<LoginVersion>(option)
        } else if key == VoiceBroadcastFeature::KEY {
            self.override_raw::<VoiceBroadcastFeature>(option)
        } else {
            Err(FeatureError::UnknownFeature(key.to_string()))
        }
    }

    fn override_raw<T: EnumFeature>(&self, option: Option<&str>) -> Result<(), FeatureError> {
        let value = option
            .map(|raw| {
                T::parse(raw).ok_or_else(|| FeatureError::UnknownOption {
                    feature: T::KEY.to_string(),
                    option: raw.to_string(),
                    expected: T::options()
                        .iter()
                        .map(|o| o.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            })
            .transpose()?;
        self.override_enum(value)
    }
}
