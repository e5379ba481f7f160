//! Core types for playlist management

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

/// Library identifier of a resolved track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryId(i64);

impl LibraryId {
    /// Create a new library ID
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Track known to the library
    Library(LibraryId),

    /// Song with metadata but no library record
    Song,

    /// Bare URL; metadata arrives later from background resolution
    Url,
}

/// Metadata snapshot for an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Location of the audio (file path or URL)
    pub url: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,

    /// Album artist (optional, falls back to artist for grouping)
    pub album_artist: Option<String>,

    /// Track number in album (optional)
    pub track_number: Option<u32>,

    /// Disc number (optional)
    pub disc_number: Option<u32>,

    /// Release year (optional)
    pub year: Option<u32>,

    /// Track duration
    pub duration: Duration,

    /// Rating in 0.0..=1.0 (optional)
    pub rating: Option<f32>,
}

impl EntryMetadata {
    /// Metadata for a bare URL, titled by the URL itself
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            title: url.clone(),
            url,
            ..Default::default()
        }
    }

    /// Key shared by all entries of the same album
    ///
    /// Entries without an album have no key and never group with anything.
    pub fn album_key(&self) -> Option<String> {
        let album = self.album.as_deref().filter(|a| !a.is_empty())?;
        let artist = self.album_artist.as_deref().unwrap_or(&self.artist);
        Some(format!("{}\u{1f}{}", artist.to_lowercase(), album.to_lowercase()))
    }

    /// Case-insensitive match against title, artist and album
    ///
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.artist.to_lowercase().contains(needle)
            || self
                .album
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(needle))
    }
}

/// One playable item in the playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    kind: EntryKind,
    metadata: EntryMetadata,

    /// Temporary metadata pushed by a stream (radio titles etc.)
    #[serde(skip)]
    stream_metadata: Option<EntryMetadata>,

    /// False when the entry is greyed out / unplayable
    valid: bool,

    /// True while a URL entry waits for background resolution
    pending: bool,
}

impl Entry {
    /// Entry backed by a library track
    pub fn library(id: LibraryId, metadata: EntryMetadata) -> Self {
        Self::with_kind(EntryKind::Library(id), metadata)
    }

    /// Entry for a song that is not in the library
    pub fn song(metadata: EntryMetadata) -> Self {
        Self::with_kind(EntryKind::Song, metadata)
    }

    /// Unresolved URL entry
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            pending: true,
            ..Self::with_kind(EntryKind::Url, EntryMetadata::from_url(url))
        }
    }

    fn with_kind(kind: EntryKind, metadata: EntryMetadata) -> Self {
        Self {
            kind,
            metadata,
            stream_metadata: None,
            valid: true,
            pending: false,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Library identifier, if this entry is a library track
    pub fn library_id(&self) -> Option<LibraryId> {
        match self.kind {
            EntryKind::Library(id) => Some(id),
            EntryKind::Song | EntryKind::Url => None,
        }
    }

    /// Metadata to display (stream metadata wins while present)
    pub fn metadata(&self) -> &EntryMetadata {
        self.stream_metadata.as_ref().unwrap_or(&self.metadata)
    }

    /// Metadata ignoring any stream override
    pub fn base_metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    pub fn url_str(&self) -> &str {
        &self.metadata.url
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Only library tracks have somewhere to persist a rating
    pub fn can_rate(&self) -> bool {
        matches!(self.kind, EntryKind::Library(_))
    }

    /// Mark the entry invalid (greyed out) or valid again
    pub fn with_validity(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    pub(crate) fn set_metadata(&mut self, metadata: EntryMetadata) {
        self.metadata = metadata;
    }

    pub(crate) fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub(crate) fn set_rating(&mut self, rating: f32) {
        self.metadata.rating = Some(rating);
    }

    /// Apply metadata produced by background resolution
    pub(crate) fn resolve(&mut self, mut metadata: EntryMetadata) {
        if metadata.url.is_empty() {
            metadata.url = std::mem::take(&mut self.metadata.url);
        }
        self.metadata = metadata;
        self.pending = false;
        self.valid = true;
    }

    /// Background resolution failed: keep stale metadata, grey out
    pub(crate) fn fail_resolution(&mut self) {
        self.pending = false;
        self.valid = false;
    }

    pub(crate) fn set_stream_metadata(&mut self, metadata: EntryMetadata) {
        self.stream_metadata = Some(metadata);
    }

    pub(crate) fn clear_stream_metadata(&mut self) -> bool {
        self.stream_metadata.take().is_some()
    }
}

/// Playback state of the current entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing playing
    Stopped,

    /// Current entry is playing
    Playing,

    /// Current entry is paused
    Paused,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Stop when the end is reached
    Off,

    /// Loop the current entry only
    Track,

    /// Loop the album of the current entry
    Album,

    /// Loop the whole playlist
    Playlist,
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    /// Natural order
    Off,

    /// Every entry shuffled independently
    All,

    /// Albums kept in order, entries shuffled inside each album
    InsideAlbum,

    /// Album order shuffled, entries inside each album in natural order
    Albums,

    /// Album order shuffled and entries shuffled inside each album
    AlbumsAndTracks,
}

impl ShuffleMode {
    /// Whether albums stay contiguous in play order
    pub fn groups_albums(self) -> bool {
        matches!(
            self,
            ShuffleMode::InsideAlbum | ShuffleMode::Albums | ShuffleMode::AlbumsAndTracks
        )
    }
}

/// Column used by [`crate::Playlist::sort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortColumn {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Track,
    Disc,
    Year,
    Length,
    Url,
    Rating,
}

impl SortColumn {
    /// Compare two entries on this column (ascending)
    pub fn compare(self, a: &Entry, b: &Entry) -> Ordering {
        let (a, b) = (a.metadata(), b.metadata());
        match self {
            SortColumn::Title => cmp_text(&a.title, &b.title),
            SortColumn::Artist => cmp_text(&a.artist, &b.artist),
            SortColumn::Album => cmp_text(
                a.album.as_deref().unwrap_or_default(),
                b.album.as_deref().unwrap_or_default(),
            ),
            SortColumn::AlbumArtist => cmp_text(
                a.album_artist.as_deref().unwrap_or(&a.artist),
                b.album_artist.as_deref().unwrap_or(&b.artist),
            ),
            SortColumn::Track => a.track_number.cmp(&b.track_number),
            SortColumn::Disc => a.disc_number.cmp(&b.disc_number),
            SortColumn::Year => a.year.cmp(&b.year),
            SortColumn::Length => a.duration.cmp(&b.duration),
            SortColumn::Url => a.url.cmp(&b.url),
            SortColumn::Rating => a
                .rating
                .unwrap_or(0.0)
                .total_cmp(&b.rating.unwrap_or(0.0)),
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Where and how a batch of entries is inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Row to insert before; `None` (or out of range) appends
    pub position: Option<usize>,

    /// Request playback of the first inserted row
    pub play_now: bool,

    /// Also append the inserted rows to the play-next queue
    pub enqueue: bool,
}

impl InsertOptions {
    /// Insert before `row`
    pub fn at(row: usize) -> Self {
        Self {
            position: Some(row),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn play_now(mut self) -> Self {
        self.play_now = true;
        self
    }

    #[must_use]
    pub fn enqueue(mut self) -> Self {
        self.enqueue = true;
        self
    }
}
