//! Integration tests for editing, navigation and the play-next overlay
//!
//! Every test goes through the public `Playlist` API only.

use soul_playlist::{
    ChangeKind, Entry, EntryMetadata, InsertOptions, Playlist, PlaylistConfig, PlaylistEvent,
    RepeatMode, ShuffleMode, VetoListener,
};
use std::sync::Arc;
use std::time::Duration;

// ===== Test Helpers =====

fn create_entry(title: &str) -> Entry {
    Entry::song(EntryMetadata {
        url: format!("/music/{title}.flac"),
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        duration: Duration::from_secs(200),
        ..Default::default()
    })
}

fn create_album_entry(title: &str, album: &str) -> Entry {
    Entry::song(EntryMetadata {
        url: format!("/music/{album}/{title}.flac"),
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        album: Some(album.to_string()),
        duration: Duration::from_secs(200),
        ..Default::default()
    })
}

fn seeded_playlist() -> Playlist {
    Playlist::new(
        1,
        PlaylistConfig {
            shuffle_seed: Some(1234),
            ..Default::default()
        },
    )
}

fn playlist_of(titles: &[&str]) -> Playlist {
    let mut playlist = seeded_playlist();
    playlist.insert_with(
        titles.iter().map(|t| create_entry(t)).collect(),
        InsertOptions::at(0),
    );
    playlist.drain_events();
    playlist
}

fn titles(playlist: &Playlist) -> Vec<String> {
    playlist
        .all_entries()
        .iter()
        .map(|e| e.metadata().title.clone())
        .collect()
}

fn title_at(playlist: &Playlist, row: usize) -> String {
    playlist.entry_at(row).unwrap().metadata().title.clone()
}

// ===== Scenarios =====

#[test]
fn test_repeat_playlist_wraps() {
    let mut playlist = playlist_of(&["A", "B", "C", "D", "E"]);
    playlist.set_repeat(RepeatMode::Playlist);
    playlist.set_shuffle(ShuffleMode::Off);
    playlist.set_current_row(0);

    let mut played = Vec::new();
    for _ in 0..5 {
        let row = playlist.advance().unwrap();
        played.push(title_at(&playlist, row));
    }

    assert_eq!(played, vec!["B", "C", "D", "E", "A"]);
}

#[test]
fn test_remove_and_undo_restores_positions() {
    let mut playlist = playlist_of(&["A", "B", "C", "D", "E"]);

    assert_eq!(playlist.remove_rows(&[3, 1]), 2);
    assert_eq!(titles(&playlist), vec!["A", "C", "E"]);

    assert!(playlist.undo());
    assert_eq!(titles(&playlist), vec!["A", "B", "C", "D", "E"]);
}

#[test]
fn test_move_destination_after_removal() {
    let mut playlist = playlist_of(&["A", "B", "C", "D"]);

    assert!(playlist.move_rows(&[0], 2));
    assert_eq!(titles(&playlist), vec!["B", "C", "A", "D"]);

    playlist.undo();
    assert_eq!(titles(&playlist), vec!["A", "B", "C", "D"]);

    playlist.redo();
    assert_eq!(titles(&playlist), vec!["B", "C", "A", "D"]);
}

#[test]
fn test_veto_union() {
    struct Reject(&'static str);

    impl VetoListener for Reject {
        fn evaluate(&self, _existing: &[&Entry], candidates: &[Entry]) -> Vec<usize> {
            candidates
                .iter()
                .enumerate()
                .filter(|(_, e)| e.metadata().title == self.0)
                .map(|(i, _)| i)
                .collect()
        }
    }

    let mut playlist = seeded_playlist();
    let l1 = Arc::new(Reject("b"));
    let l2 = Arc::new(Reject("c"));
    playlist.add_veto_listener(&l1);
    playlist.add_veto_listener(&l2);

    let inserted = playlist.insert(vec![create_entry("a"), create_entry("b"), create_entry("c")]);
    assert_eq!(inserted, 1);
    assert_eq!(titles(&playlist), vec!["a"]);

    // Nothing rejected ever reaches the undo history
    assert_eq!(playlist.undo_text().as_deref(), Some("Add 1 song"));
}

#[test]
fn test_veto_listener_removed_after_drop() {
    let mut playlist = seeded_playlist();
    let reject_all = Arc::new(|_: &[&Entry], candidates: &[Entry]| -> Vec<usize> {
        (0..candidates.len()).collect()
    });
    playlist.add_veto_listener(&reject_all);
    assert_eq!(playlist.insert(vec![create_entry("x")]), 0);

    drop(reject_all);
    assert_eq!(playlist.insert(vec![create_entry("x")]), 1);
}

#[test]
fn test_repeat_track_repeats_under_any_shuffle() {
    for shuffle in [
        ShuffleMode::Off,
        ShuffleMode::All,
        ShuffleMode::InsideAlbum,
        ShuffleMode::Albums,
        ShuffleMode::AlbumsAndTracks,
    ] {
        let mut playlist = playlist_of(&["A", "B", "C"]);
        playlist.set_shuffle(shuffle);
        playlist.set_repeat(RepeatMode::Track);
        playlist.set_current_row(1);

        assert_eq!(playlist.next_row(), Some(1), "{shuffle:?}");
        assert_eq!(playlist.advance(), Some(1));
        assert_eq!(playlist.previous_row(), Some(1));
    }
}

#[test]
fn test_repeat_off_stops_at_end() {
    let mut playlist = playlist_of(&["A", "B"]);
    playlist.set_current_row(1);

    assert_eq!(playlist.next_row(), None);
    assert_eq!(playlist.advance(), None);
    assert_eq!(playlist.current_row(), Some(1));

    playlist.set_current_row(0);
    assert_eq!(playlist.previous_row(), None);
    assert_eq!(playlist.retreat(), None);
}

#[test]
fn test_repeat_album_loops_album() {
    let mut playlist = seeded_playlist();
    playlist.insert(vec![
        create_album_entry("a1", "A"),
        create_album_entry("a2", "A"),
        create_album_entry("b1", "B"),
    ]);
    playlist.set_repeat(RepeatMode::Album);
    playlist.set_current_row(0);

    assert_eq!(playlist.advance(), Some(1));
    assert_eq!(playlist.advance(), Some(0));
}

// ===== Overlay =====

#[test]
fn test_overlay_consumed_before_natural_order() {
    let mut playlist = playlist_of(&["A", "B", "C", "D", "E"]);
    playlist.set_current_row(0);
    playlist.enqueue(&[3]);
    playlist.enqueue(&[4]);

    assert_eq!(playlist.next_row(), Some(3));
    assert_eq!(playlist.advance(), Some(3));
    assert_eq!(playlist.advance(), Some(4));

    // Natural order resumes where it would have without the overlay
    assert_eq!(playlist.advance(), Some(1));
    assert_eq!(playlist.advance(), Some(2));
    assert!(playlist.overlay_rows().is_empty());
}

#[test]
fn test_enqueue_next_jumps_ahead() {
    let mut playlist = playlist_of(&["A", "B", "C", "D"]);
    playlist.enqueue(&[2]);
    playlist.enqueue_next(&[3]);

    assert_eq!(playlist.overlay_rows(), vec![3, 2]);
    assert_eq!(playlist.queue_position(2), Some(1));
    assert_eq!(playlist.queue_position(0), None);

    assert!(playlist.move_in_queue(0, 1));
    assert_eq!(playlist.overlay_rows(), vec![2, 3]);

    assert_eq!(playlist.dequeue(&[2]), 1);
    playlist.clear_queue();
    assert!(playlist.overlay_rows().is_empty());
}

#[test]
fn test_removal_purges_overlay_atomically() {
    let mut playlist = playlist_of(&["A", "B", "C", "D"]);
    playlist.enqueue(&[1, 2]);
    playlist.drain_events();

    playlist.remove_rows(&[1]);
    let events = playlist.drain_events();

    assert_eq!(
        events[0],
        PlaylistEvent::ListChanged {
            kind: ChangeKind::Removed,
            range: 1..2,
        }
    );
    assert_eq!(events[1], PlaylistEvent::OverlayChanged { length: 1 });
    assert_eq!(playlist.overlay_rows(), vec![1]);
    assert_eq!(title_at(&playlist, 1), "C");
}

#[test]
fn test_overlay_follows_moves() {
    let mut playlist = playlist_of(&["A", "B", "C", "D"]);
    playlist.enqueue(&[3]);

    playlist.move_rows(&[3], 0);
    assert_eq!(playlist.overlay_rows(), vec![0]);
}

#[test]
fn test_setting_current_consumes_queued_row() {
    let mut playlist = playlist_of(&["A", "B", "C"]);
    playlist.enqueue(&[2]);

    playlist.set_current_row(2);
    assert!(playlist.overlay_rows().is_empty());
}

// ===== Pointers =====

#[test]
fn test_current_unset_on_removal_and_back_on_undo() {
    let mut playlist = playlist_of(&["A", "B", "C"]);
    playlist.set_current_row(1);
    playlist.drain_events();

    playlist.remove_rows(&[1]);
    assert_eq!(playlist.current_row(), None);
    assert!(playlist
        .drain_events()
        .contains(&PlaylistEvent::CurrentChanged { row: None }));

    playlist.undo();
    assert_eq!(playlist.current_row(), Some(1));
    assert_eq!(playlist.get_current_entry().unwrap().metadata().title, "B");
}

#[test]
fn test_current_gone_for_good_without_undo() {
    let mut playlist = playlist_of(&["A", "B", "C"]);
    playlist.set_current_row(1);

    playlist.remove_rows_without_undo(&[1]);
    while playlist.undo() {}

    assert_eq!(playlist.current_row(), None);
    assert!(playlist.is_empty());
}

#[test]
fn test_redo_after_permanent_removal_spares_other_rows() {
    let mut playlist = playlist_of(&["A", "B", "C", "D"]);
    playlist.set_current_row(1);

    playlist.remove_rows(&[1]);
    playlist.undo();
    playlist.remove_rows_without_undo(&[1]);
    assert_eq!(playlist.current_row(), None);

    // Redo finds nothing left to remove, however often it runs
    assert!(playlist.redo());
    assert!(playlist.undo());
    assert!(playlist.redo());
    assert_eq!(titles(&playlist), vec!["A", "C", "D"]);
    assert_eq!(playlist.current_row(), None);
}

#[test]
fn test_natural_order_survives_anchor_removal() {
    let mut playlist = playlist_of(&["A", "B", "C", "D", "E"]);
    playlist.set_current_row(1);
    playlist.enqueue(&[4]);
    assert_eq!(playlist.advance(), Some(4));

    // B was where natural order stood; C still comes next
    playlist.remove_rows(&[1]);
    assert_eq!(titles(&playlist), vec!["A", "C", "D", "E"]);
    assert_eq!(playlist.next_row(), Some(1));
    assert_eq!(playlist.advance(), Some(1));
    assert_eq!(title_at(&playlist, 1), "C");
}

#[test]
fn test_natural_order_restarts_when_first_anchor_removed() {
    let mut playlist = playlist_of(&["A", "B", "C", "D"]);
    playlist.set_current_row(0);
    playlist.enqueue(&[3]);
    assert_eq!(playlist.advance(), Some(3));

    playlist.remove_rows(&[0]);
    assert_eq!(playlist.next_row(), Some(0));
    assert_eq!(title_at(&playlist, 0), "B");
}

#[test]
fn test_current_follows_insert_above() {
    let mut playlist = playlist_of(&["A", "B"]);
    playlist.set_current_row(1);

    playlist.insert_with(vec![create_entry("X"), create_entry("Y")], InsertOptions::at(0));
    assert_eq!(playlist.current_row(), Some(3));
    assert_eq!(playlist.get_current_entry().unwrap().metadata().title, "B");
}

#[test]
fn test_redo_branch_truncated_by_new_edit() {
    let mut playlist = playlist_of(&["A", "B", "C"]);
    playlist.remove_rows(&[0]);
    playlist.undo();
    assert!(playlist.can_redo());

    playlist.move_rows(&[2], 0);
    assert!(!playlist.can_redo());
    assert_eq!(titles(&playlist), vec!["C", "A", "B"]);
}

#[test]
fn test_undo_underflow_is_noop() {
    let mut playlist = seeded_playlist();
    assert!(!playlist.undo());
    assert!(!playlist.redo());
    assert!(playlist.undo_text().is_none());
}

#[test]
fn test_undo_limit() {
    let mut playlist = Playlist::new(
        1,
        PlaylistConfig {
            undo_limit: 2,
            ..Default::default()
        },
    );
    for title in ["A", "B", "C", "D"] {
        playlist.insert(vec![create_entry(title)]);
    }

    assert!(playlist.undo());
    assert!(playlist.undo());
    assert!(!playlist.undo());
    assert_eq!(titles(&playlist), vec!["A", "B"]);
}

// ===== Events =====

#[test]
fn test_events_in_mutation_order() {
    let mut playlist = playlist_of(&["A", "B", "C"]);

    playlist.remove_rows(&[0]);
    playlist.move_rows(&[1], 0);
    playlist.undo();

    let kinds: Vec<ChangeKind> = playlist
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            PlaylistEvent::ListChanged { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Removed, ChangeKind::Moved, ChangeKind::Moved]
    );
}

#[test]
fn test_filtered_current_continues_after_it() {
    let mut playlist = playlist_of(&["keep 1", "skip", "keep 2"]);
    playlist.set_current_row(1);
    playlist.set_text_filter("keep");

    assert_eq!(playlist.next_row(), Some(2));
    assert_eq!(playlist.virtual_order(), vec![0, 2]);
}
