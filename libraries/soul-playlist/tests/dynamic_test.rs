//! Integration tests for dynamic playlists
//!
//! A generator keeps the upcoming window filled while played entries beyond
//! the history window are trimmed.

use soul_playlist::{
    Entry, EntryMetadata, Generator, Playlist, PlaylistConfig, PlaylistError, PlaylistEvent,
    Result,
};
use std::sync::Once;

static INIT: Once = Once::new();

// ===== Test Helpers =====

/// Yields "gen-0", "gen-1", ... until `left` runs out
struct Counter {
    next: usize,
    left: usize,
}

impl Counter {
    fn new(left: usize) -> Box<Self> {
        Box::new(Self { next: 0, left })
    }
}

impl Generator for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn next_batch(&mut self, count: usize) -> Result<Vec<Entry>> {
        let n = count.min(self.left);
        self.left -= n;
        let batch = (self.next..self.next + n)
            .map(|i| {
                Entry::song(EntryMetadata {
                    title: format!("gen-{i}"),
                    ..Default::default()
                })
            })
            .collect();
        self.next += n;
        Ok(batch)
    }
}

struct Offline;

impl Generator for Offline {
    fn name(&self) -> &str {
        "offline"
    }

    fn next_batch(&mut self, _count: usize) -> Result<Vec<Entry>> {
        Err(PlaylistError::generator("service unavailable"))
    }
}

fn create_dynamic_playlist() -> Playlist {
    // Initialize logging once
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });

    Playlist::new(
        7,
        PlaylistConfig {
            dynamic_history: 2,
            dynamic_future: 3,
            shuffle_seed: Some(99),
            ..Default::default()
        },
    )
}

fn titles(playlist: &Playlist) -> Vec<String> {
    playlist
        .all_entries()
        .iter()
        .map(|e| e.metadata().title.clone())
        .collect()
}

fn turned_off(events: &[PlaylistEvent]) -> bool {
    events.contains(&PlaylistEvent::DynamicModeChanged { active: false })
}

// ===== Refill =====

#[test]
fn test_turning_on_fills_window() {
    let mut playlist = create_dynamic_playlist();
    playlist.turn_on_dynamic(Counter::new(100));

    assert!(playlist.is_dynamic());
    assert_eq!(playlist.dynamic_generator_name(), Some("counter"));
    assert_eq!(titles(&playlist), vec!["gen-0", "gen-1", "gen-2"]);
    assert!(playlist
        .drain_events()
        .contains(&PlaylistEvent::DynamicModeChanged { active: true }));
}

#[test]
fn test_advancing_refills_and_trims_history() {
    let mut playlist = create_dynamic_playlist();
    playlist.turn_on_dynamic(Counter::new(100));

    playlist.set_current_row(0);
    assert_eq!(playlist.len(), 4);

    assert_eq!(playlist.advance(), Some(1));
    assert_eq!(playlist.advance(), Some(2));
    assert_eq!(playlist.len(), 6);

    // Fourth entry: one played entry too many, the oldest goes
    assert_eq!(playlist.advance(), Some(2));
    assert_eq!(playlist.get_current_entry().unwrap().metadata().title, "gen-3");
    assert_eq!(
        titles(&playlist),
        vec!["gen-1", "gen-2", "gen-3", "gen-4", "gen-5", "gen-6"]
    );
}

#[test]
fn test_removal_refills() {
    let mut playlist = create_dynamic_playlist();
    playlist.turn_on_dynamic(Counter::new(100));

    playlist.remove_rows(&[0]);
    assert_eq!(titles(&playlist), vec!["gen-1", "gen-2", "gen-3"]);
}

#[test]
fn test_turning_off_keeps_entries() {
    let mut playlist = create_dynamic_playlist();
    playlist.turn_on_dynamic(Counter::new(100));
    playlist.drain_events();

    playlist.turn_off_dynamic();
    assert!(!playlist.is_dynamic());
    assert!(turned_off(&playlist.drain_events()));

    playlist.remove_rows(&[0]);
    assert_eq!(playlist.len(), 2);
    playlist.drain_events();

    // Second turn-off has nothing to report
    playlist.turn_off_dynamic();
    assert!(!playlist.has_pending_events());
}

// ===== Generator Failure =====

#[test]
fn test_exhausted_generator_leaves_dynamic_mode() {
    let mut playlist = create_dynamic_playlist();
    playlist.turn_on_dynamic(Counter::new(4));
    playlist.set_current_row(0);
    assert_eq!(playlist.len(), 4);
    playlist.drain_events();

    playlist.advance();

    let events = playlist.drain_events();
    assert!(turned_off(&events));
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaylistEvent::Notice { message } if message.contains("counter"))));
    assert!(!playlist.is_dynamic());
    assert_eq!(playlist.len(), 4);
}

#[test]
fn test_failing_generator_turns_off_immediately() {
    let mut playlist = create_dynamic_playlist();
    playlist.turn_on_dynamic(Box::new(Offline));

    assert!(!playlist.is_dynamic());
    assert!(playlist.is_empty());
    assert!(turned_off(&playlist.drain_events()));
}

// ===== Repopulate =====

#[test]
fn test_repopulate_replaces_upcoming_but_keeps_queued() {
    let mut playlist = create_dynamic_playlist();
    playlist.turn_on_dynamic(Counter::new(100));
    playlist.set_current_row(0);
    playlist.enqueue(&[2]);

    playlist.repopulate_dynamic();

    assert_eq!(titles(&playlist), vec!["gen-0", "gen-2", "gen-4", "gen-5"]);
    assert_eq!(playlist.overlay_rows(), vec![1]);
    assert_eq!(playlist.current_row(), Some(0));
}

#[test]
fn test_repopulate_without_generator_does_nothing() {
    let mut playlist = create_dynamic_playlist();
    playlist.insert(vec![Entry::song(EntryMetadata::default())]);
    playlist.drain_events();

    playlist.repopulate_dynamic();
    assert_eq!(playlist.len(), 1);
    assert!(!playlist.has_pending_events());
}
