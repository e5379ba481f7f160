//! Playlist Events
//!
//! Notifications for views and collaborators. They are queued in the order
//! the playlist changed and handed out by `Playlist::drain_events`:
//! - Structural changes (one `ListChanged` per edit, never one per row)
//! - Single-row updates (metadata, validity, rating)
//! - Current row, overlay, sequencing and playback state changes
//! - Requests for collaborators (resolve a URL, persist a rating, play a row)

use crate::handle::EntryHandle;
use crate::types::{LibraryId, PlaybackState, RepeatMode, ShuffleMode};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Kind of structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Rows were inserted
    Inserted,
    /// Rows were removed
    Removed,
    /// Rows were moved
    Moved,
    /// The whole order was replaced (sort, shuffle, restore)
    Reordered,
}

/// Events emitted by the playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaylistEvent {
    /// Row structure changed
    ListChanged {
        /// What happened
        kind: ChangeKind,
        /// Affected rows; for removals, the rows the entries used to occupy
        range: Range<usize>,
    },

    /// Contents of a single row changed in place
    RowChanged {
        /// Row that changed
        row: usize,
    },

    /// Current row changed (moved by an edit, or set explicitly)
    CurrentChanged {
        /// New current row, `None` when unset
        row: Option<usize>,
    },

    /// A row should start playing
    PlayRequested {
        /// Row to play
        row: usize,
    },

    /// A URL entry needs background metadata resolution
    MetadataRequested {
        /// Entry to resolve
        handle: EntryHandle,
        /// URL to resolve
        url: String,
    },

    /// A rating should be persisted in the background
    RatingRequested {
        /// Rated entry
        handle: EntryHandle,
        /// Library item to store the rating on
        library_id: LibraryId,
        /// Rating in 0.0..=1.0
        rating: f32,
    },

    /// Play-next overlay changed
    OverlayChanged {
        /// New overlay length
        length: usize,
    },

    /// Shuffle or repeat mode changed
    SequenceChanged {
        /// Shuffle mode
        shuffle: ShuffleMode,
        /// Repeat mode
        repeat: RepeatMode,
    },

    /// Playback state of the current row changed
    StateChanged {
        /// The new state
        state: PlaybackState,
    },

    /// Dynamic refill mode switched on or off
    DynamicModeChanged {
        /// Whether a generator is attached
        active: bool,
    },

    /// Something the user should be told about (generator exhausted etc.)
    Notice {
        /// Message for the user
        message: String,
    },

    /// A saved playlist finished loading
    RestoreFinished {
        /// Number of entries restored
        count: usize,
    },
}

impl PlaylistEvent {
    /// Whether the event changes row structure
    pub fn is_structural(&self) -> bool {
        matches!(self, PlaylistEvent::ListChanged { .. })
    }
}
