//! Saving and restoring playlists
//!
//! The playlist hands a [`PlaylistBackend`] an ordered list of entries plus
//! its sequencing settings, and gets the same back on restore. How a backend
//! stores that is its own business; [`JsonFileBackend`] keeps one JSON file
//! per playlist.

use crate::error::{PlaylistError, Result};
use crate::types::{Entry, RepeatMode, ShuffleMode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted form of a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    /// Entries in row order
    pub entries: Vec<Entry>,

    /// Row that was current when saved
    #[serde(default)]
    pub current_row: Option<usize>,

    pub shuffle: ShuffleMode,
    pub repeat: RepeatMode,
}

impl PlaylistSnapshot {
    /// Encode as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Storage for playlist snapshots
#[async_trait]
pub trait PlaylistBackend: Send + Sync {
    /// Store `snapshot` under `id`, replacing what was there
    async fn save(&self, id: i64, snapshot: &PlaylistSnapshot) -> Result<()>;

    /// Load the snapshot stored under `id`, if any
    async fn restore(&self, id: i64) -> Result<Option<PlaylistSnapshot>>;
}

/// Backend writing `playlist-<id>.json` files into a directory
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: i64) -> PathBuf {
        self.dir.join(format!("playlist-{id}.json"))
    }
}

#[async_trait]
impl PlaylistBackend for JsonFileBackend {
    async fn save(&self, id: i64, snapshot: &PlaylistSnapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write then rename so a crash never leaves a half-written file
        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn restore(&self, id: i64) -> Result<Option<PlaylistSnapshot>> {
        let path = self.path_for(id);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PlaylistError::persistence(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        PlaylistSnapshot::from_json(&json).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryMetadata;

    fn snapshot() -> PlaylistSnapshot {
        PlaylistSnapshot {
            entries: vec![
                Entry::song(EntryMetadata {
                    title: "One".to_string(),
                    ..Default::default()
                }),
                Entry::url("http://radio.example/live"),
            ],
            current_row: Some(1),
            shuffle: ShuffleMode::Albums,
            repeat: RepeatMode::Playlist,
        }
    }

    #[test]
    fn json_keeps_pending_state() {
        let json = snapshot().to_json().unwrap();
        let back = PlaylistSnapshot::from_json(&json).unwrap();

        assert_eq!(back, snapshot());
        assert!(back.entries[1].is_pending());
    }

    #[test]
    fn bad_json_is_serialization_error() {
        assert!(matches!(
            PlaylistSnapshot::from_json("{not json"),
            Err(PlaylistError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("playlists"));

        assert!(backend.restore(7).await.unwrap().is_none());

        backend.save(7, &snapshot()).await.unwrap();
        assert_eq!(backend.restore(7).await.unwrap(), Some(snapshot()));
        assert!(backend.restore(8).await.unwrap().is_none());
    }
}
