//! Soul Player - Playlist Engine
//!
//! The ordered, editable list of entries behind a "now playing" queue.
//!
//! This crate provides:
//! - Entry storage with stable handles (current / last-played / stop-after
//!   survive any reordering)
//! - Undo/redo for inserts, removals, moves, sorts and shuffles
//! - Play order under shuffle (off, all, inside album, albums, albums and
//!   tracks) and repeat (off, track, album, playlist) modes
//! - A "play next" overlay that wins over the play order
//! - Veto listeners that can reject entries before insertion
//! - Dynamic playlists refilled from a generator
//! - A completion queue for background metadata resolution and ratings
//! - Snapshots for persistence
//!
//! # Architecture
//!
//! `soul-playlist` owns no threads and does no I/O on its own:
//! - Changes are reported as [`PlaylistEvent`]s, drained by the caller
//! - Background work posts results through a [`CompletionSender`]
//! - Storage goes through the [`PlaylistBackend`] trait
//!
//! # Example: Editing and Undo
//!
//! ```rust
//! use soul_playlist::{Entry, EntryMetadata, Playlist, PlaylistConfig};
//!
//! let mut playlist = Playlist::new(1, PlaylistConfig::default());
//!
//! let song = |title: &str| {
//!     Entry::song(EntryMetadata {
//!         title: title.to_string(),
//!         ..Default::default()
//!     })
//! };
//! playlist.insert(vec![song("A"), song("B"), song("C"), song("D")]);
//!
//! // Destination is counted without the moved rows
//! playlist.move_rows(&[0], 2);
//! assert_eq!(playlist.entry_at(2).unwrap().metadata().title, "A");
//!
//! playlist.undo();
//! assert_eq!(playlist.entry_at(0).unwrap().metadata().title, "A");
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use soul_playlist::{Playlist, RepeatMode, ShuffleMode};
//!
//! let mut playlist = Playlist::default();
//!
//! // Keep albums together, shuffle their order
//! playlist.set_shuffle(ShuffleMode::Albums);
//!
//! // Loop the whole list
//! playlist.set_repeat(RepeatMode::Playlist);
//! ```
//!
//! # Example: Background Resolution
//!
//! ```rust
//! use soul_playlist::{Entry, EntryMetadata, Playlist, PlaylistEvent};
//!
//! let mut playlist = Playlist::default();
//! playlist.insert(vec![Entry::url("http://radio.example/live")]);
//!
//! // The playlist asks for metadata of unresolved URLs
//! let handle = playlist
//!     .drain_events()
//!     .into_iter()
//!     .find_map(|event| match event {
//!         PlaylistEvent::MetadataRequested { handle, .. } => Some(handle),
//!         _ => None,
//!     })
//!     .unwrap();
//!
//! // Some worker resolves it and reports back
//! let sender = playlist.completion_sender();
//! sender.metadata_resolved(
//!     handle,
//!     EntryMetadata {
//!         title: "Live Radio".to_string(),
//!         ..Default::default()
//!     },
//! );
//!
//! // Applied on the owning thread
//! playlist.apply_completions();
//! assert_eq!(playlist.entry_at(0).unwrap().metadata().title, "Live Radio");
//! ```

mod commands;
pub mod completion;
pub mod config;
mod core;
pub mod dynamic;
mod error;
pub mod events;
mod handle;
mod history;
pub mod persistence;
mod playlist;
pub mod queue;
pub mod sequence;
mod store;
pub mod transfer;
pub mod types;
pub mod veto;

// Public exports
pub use completion::{Completion, CompletionKind, CompletionSender};
pub use crate::config::PlaylistConfig;
pub use crate::core::EntryFilter;
pub use dynamic::{DynamicRefillController, Generator, RefillPlan};
pub use error::{PlaylistError, Result};
pub use events::{ChangeKind, PlaylistEvent};
pub use handle::EntryHandle;
pub use history::MutationLog;
pub use persistence::{JsonFileBackend, PlaylistBackend, PlaylistSnapshot};
pub use playlist::Playlist;
pub use queue::QueueOverlay;
pub use sequence::VirtualSequencer;
pub use store::EntryStore;
pub use transfer::{encode_rows, TransferPayload};
pub use types::{
    Entry, EntryKind, EntryMetadata, InsertOptions, LibraryId, PlaybackState, RepeatMode,
    ShuffleMode, SortColumn, SortOrder,
};
pub use veto::{ListenerId, VetoListener, VetoPipeline};
