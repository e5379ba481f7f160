//! Playlist configuration
//!
//! Defaults come from [`PlaylistConfig::default`]; [`PlaylistConfig::load`]
//! layers an optional config file and `SOUL_PLAYLIST__*` environment
//! variables on top.

use crate::error::{PlaylistError, Result};
use crate::types::{RepeatMode, ShuffleMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Initial shuffle mode (default: Off)
    pub shuffle: ShuffleMode,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Maximum undo depth, 0 = unlimited (default: 64)
    pub undo_limit: usize,

    /// Played entries kept before the current one in dynamic mode (default: 5)
    pub dynamic_history: usize,

    /// Upcoming entries kept after the current one in dynamic mode (default: 15)
    pub dynamic_future: usize,

    /// Fixed seed for shuffle order, random when unset
    pub shuffle_seed: Option<u64>,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            shuffle: ShuffleMode::Off,
            repeat: RepeatMode::Off,
            undo_limit: 64,
            dynamic_history: 5,
            dynamic_future: 15,
            shuffle_seed: None,
        }
    }
}

impl PlaylistConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// The file format follows its extension (`.toml`, `.json`, ...). A path
    /// that does not exist is skipped. Environment variables use the
    /// `SOUL_PLAYLIST__` prefix, e.g. `SOUL_PLAYLIST__UNDO_LIMIT=100`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path.filter(|p| p.exists()) {
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("SOUL_PLAYLIST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.dynamic_future == 0 {
            return Err(PlaylistError::Config(
                "dynamic_future must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
