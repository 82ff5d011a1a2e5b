//! Undo engine configuration.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Configuration for the undo manager and the operations it replays.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct UndoConfig {
    /// How many operations the history keeps (1 = single undo slot).
    #[builder(default = "1")]
    pub history_depth: usize,

    /// Tolerance in seconds when matching trash deletion times.
    #[builder(default = "2")]
    pub trash_time_epsilon_secs: i64,

    /// Move to trash instead of deleting when the trash is available.
    #[builder(default = "true")]
    pub use_trash: bool,

    /// Buffer size of the state change broadcast channel.
    #[builder(default = "100")]
    pub event_channel_size: usize,

    /// Default log filter when `RUST_LOG` is not set.
    #[builder(default = "default_log_level()")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl UndoConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.history_depth == Some(0) {
            return Err("History depth must be at least 1".to_string());
        }
        if let Some(epsilon) = self.trash_time_epsilon_secs {
            if epsilon < 0 {
                return Err("Trash time epsilon cannot be negative".to_string());
            }
        }
        if self.event_channel_size == Some(0) {
            return Err("Event channel size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl UndoConfig {
    /// Create a new config builder.
    pub fn builder() -> UndoConfigBuilder {
        UndoConfigBuilder::default()
    }

    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load a config file if it exists, otherwise return the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check values that the builder would have rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::Invalid {
            message: message.to_string(),
        };
        if self.history_depth == 0 {
            return Err(invalid("history_depth must be at least 1"));
        }
        if self.trash_time_epsilon_secs < 0 {
            return Err(invalid("trash_time_epsilon_secs cannot be negative"));
        }
        if self.event_channel_size == 0 {
            return Err(invalid("event_channel_size must be at least 1"));
        }
        Ok(())
    }
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            history_depth: 1,
            trash_time_epsilon_secs: 2,
            use_trash: true,
            event_channel_size: 100,
            log_level: default_log_level(),
        }
    }
}
