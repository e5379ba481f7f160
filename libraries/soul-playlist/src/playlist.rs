//! Playlist - ordering and mutation orchestration
//!
//! Coordinates entry storage, undo history, the play-next overlay, play order,
//! veto listeners, dynamic refill and background completions.

use crate::{
    commands::{Command, Editable, ReorderKind},
    completion::{CompletionKind, CompletionQueue, CompletionSender},
    config::PlaylistConfig,
    core::{Anchor, PlaylistCore},
    dynamic::{DynamicRefillController, Generator},
    error::{PlaylistError, Result},
    events::PlaylistEvent,
    handle::EntryHandle,
    history::MutationLog,
    persistence::{PlaylistBackend, PlaylistSnapshot},
    sequence::VirtualSequencer,
    store::EntryStore,
    transfer::{drop_destination, TransferPayload},
    types::{
        Entry, EntryMetadata, InsertOptions, LibraryId, PlaybackState, RepeatMode, ShuffleMode,
        SortColumn, SortOrder,
    },
    veto::{ListenerId, VetoListener, VetoPipeline},
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An ordered, editable list of playable entries
///
/// All edits happen on the thread that owns the playlist. Background work
/// reports back through [`Playlist::completion_sender`] and is applied by
/// [`Playlist::apply_completions`].
pub struct Playlist {
    id: i64,
    config: PlaylistConfig,

    core: PlaylistCore,
    log: MutationLog,

    veto: VetoPipeline,
    dynamic: DynamicRefillController,
    completions: CompletionQueue,

    // Source of shuffle seeds
    rng: StdRng,
}

impl Playlist {
    /// Create an empty playlist
    pub fn new(id: i64, config: PlaylistConfig) -> Self {
        let mut rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sequencer = VirtualSequencer::new(config.shuffle, config.repeat, rng.gen());

        Self {
            id,
            core: PlaylistCore::new(sequencer),
            log: MutationLog::new(config.undo_limit),
            veto: VetoPipeline::new(),
            dynamic: DynamicRefillController::new(config.dynamic_history, config.dynamic_future),
            completions: CompletionQueue::new(),
            rng,
            config,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn config(&self) -> &PlaylistConfig {
        &self.config
    }

    // ===== Queries =====

    pub fn len(&self) -> usize {
        self.core.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.store.is_empty()
    }

    /// Read-only view of the entries
    pub fn store(&self) -> &EntryStore {
        &self.core.store
    }

    pub fn entry_at(&self, row: usize) -> Option<&Entry> {
        self.core.store.entry_at(row)
    }

    pub fn handle_at(&self, row: usize) -> Option<EntryHandle> {
        self.core.store.handle_at(row)
    }

    /// Row of the entry behind `handle`, if it is in the list
    pub fn row_of(&self, handle: EntryHandle) -> Option<usize> {
        self.core.store.position_of(handle)
    }

    /// Entries in row order
    pub fn all_entries(&self) -> Vec<&Entry> {
        self.core.store.iter().collect()
    }

    /// Summed duration of all entries
    pub fn total_length(&self) -> Duration {
        self.core.store.iter().map(|e| e.metadata().duration).sum()
    }

    /// Rows holding library item `id`
    pub fn entries_with_identifier(&self, id: LibraryId) -> Vec<usize> {
        self.core.store.find_by_identifier(id)
    }

    /// Row of the current entry
    pub fn current_row(&self) -> Option<usize> {
        self.core.current_row()
    }

    pub fn get_current_entry(&self) -> Option<&Entry> {
        self.current_row().and_then(|row| self.entry_at(row))
    }

    /// Row of the entry that was current before the current one
    pub fn last_played_row(&self) -> Option<usize> {
        self.core.row_of(self.core.last_played)
    }

    /// Row marked to stop playback after
    pub fn stop_after_row(&self) -> Option<usize> {
        self.core.row_of(self.core.stop_after)
    }

    // ===== Editing =====

    /// Append entries; returns how many made it past the veto listeners
    pub fn insert(&mut self, entries: Vec<Entry>) -> usize {
        self.insert_with(entries, InsertOptions::default())
    }

    /// Insert entries as one undoable step
    ///
    /// Candidates rejected by a veto listener are dropped. An out-of-range
    /// position appends.
    pub fn insert_with(&mut self, entries: Vec<Entry>, options: InsertOptions) -> usize {
        let offered = entries.len();
        let accepted = {
            let existing: Vec<&Entry> = self.core.store.iter().collect();
            self.veto.filter(&existing, entries)
        };
        if accepted.is_empty() {
            debug!(offered, "Nothing left to insert");
            return 0;
        }

        let count = accepted.len();
        let handles: Vec<EntryHandle> = accepted
            .into_iter()
            .map(|entry| self.core.store.allocate(entry))
            .collect();
        let at = options.position.unwrap_or(usize::MAX).min(self.len());

        self.record(Command::insert(handles.clone(), at));
        info!(count, offered, at, "Inserted entries");

        if options.enqueue && self.core.overlay.add_to_end(&handles) > 0 {
            self.core.emit_overlay_changed();
        }
        if options.play_now {
            if let Some(row) = self.row_of(handles[0]) {
                self.core.emit(PlaylistEvent::PlayRequested { row });
            }
        }
        count
    }

    /// Remove rows as one undoable step; returns how many were removed
    pub fn remove_rows(&mut self, rows: &[usize]) -> usize {
        let before = self.len();
        self.record(Command::remove(&self.core.store, rows));
        let removed = before - self.len();

        if removed > 0 {
            info!(removed, "Removed entries");
            self.maintain_dynamic(false);
        }
        removed
    }

    /// Remove rows without recording an undo step
    ///
    /// For system-driven removals the user must not be able to undo. The
    /// entries are gone for good and handed back.
    pub fn remove_rows_without_undo(&mut self, rows: &[usize]) -> Vec<Entry> {
        let entries = self.discard(rows);
        if !entries.is_empty() {
            self.maintain_dynamic(false);
        }
        entries
    }

    /// Move rows so they start at `dest`, as one undoable step
    ///
    /// `dest` is counted in the list with the moved rows taken out, so moving
    /// row 0 to 2 in `[A,B,C,D]` gives `[B,C,A,D]`.
    pub fn move_rows(&mut self, rows: &[usize], dest: usize) -> bool {
        self.record(Command::move_rows(&self.core.store, rows, dest))
    }

    /// Remove every row as one undoable step
    pub fn clear(&mut self) -> usize {
        let rows: Vec<usize> = (0..self.len()).collect();
        self.remove_rows(&rows)
    }

    /// Sort rows by `column`, as one undoable step
    pub fn sort(&mut self, column: SortColumn, order: SortOrder) -> bool {
        let store = &self.core.store;
        let mut handles = store.handles().to_vec();
        handles.sort_by(|a, b| {
            let ordering = match (store.get(*a), store.get(*b)) {
                (Some(a), Some(b)) => column.compare(a, b),
                _ => std::cmp::Ordering::Equal,
            };
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        let command = Command::reorder(store, handles, ReorderKind::Sort);
        self.record(command)
    }

    /// Shuffle the stored row order, as one undoable step
    ///
    /// Unlike [`Playlist::set_shuffle`] this changes the list itself.
    pub fn shuffle_items(&mut self) -> bool {
        let mut handles = self.core.store.handles().to_vec();
        handles.shuffle(&mut self.rng);

        let command = Command::reorder(&self.core.store, handles, ReorderKind::Shuffle);
        self.record(command)
    }

    /// Revert the last edit; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let done = self.log.undo(&mut self.core);
        if done {
            debug!(redo = ?self.log.redo_text(), "Undo");
        }
        done
    }

    /// Re-apply the last undone edit; false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        let done = self.log.redo(&mut self.core);
        if done {
            debug!(undo = ?self.log.undo_text(), "Redo");
        }
        done
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn undo_text(&self) -> Option<String> {
        self.log.undo_text()
    }

    pub fn redo_text(&self) -> Option<String> {
        self.log.redo_text()
    }

    pub fn history(&self) -> &MutationLog {
        &self.log
    }

    /// Run and record a command; false if it would change nothing
    fn record(&mut self, command: Command) -> bool {
        if command.is_noop(&self.core.store) {
            return false;
        }
        let orphans = self.log.push(command, &mut self.core);
        self.core.release(&orphans);
        true
    }

    /// Remove rows for good, bypassing history
    fn discard(&mut self, rows: &[usize]) -> Vec<Entry> {
        let removed = self.core.remove_without_undo(rows);
        let handles: Vec<EntryHandle> = removed.iter().map(|(_, handle)| *handle).collect();
        self.core.release(&handles)
    }

    // ===== Queue Overlay =====

    /// Queue rows to play after everything already queued
    pub fn enqueue(&mut self, rows: &[usize]) -> usize {
        let handles = self.handles_for(rows);
        let added = self.core.overlay.add_to_end(&handles);
        if added > 0 {
            self.core.emit_overlay_changed();
        }
        added
    }

    /// Queue rows to play before everything already queued
    pub fn enqueue_next(&mut self, rows: &[usize]) {
        let handles = self.handles_for(rows);
        if handles.is_empty() {
            return;
        }
        self.core.overlay.add_next(&handles);
        self.core.emit_overlay_changed();
    }

    /// Take rows out of the overlay
    pub fn dequeue(&mut self, rows: &[usize]) -> usize {
        let handles = self.handles_for(rows);
        let removed = self.core.overlay.remove_handles(&handles);
        if removed > 0 {
            self.core.emit_overlay_changed();
        }
        removed
    }

    /// Reorder the overlay
    pub fn move_in_queue(&mut self, from: usize, to: usize) -> bool {
        let moved = self.core.overlay.reorder(from, to);
        if moved && from != to {
            self.core.emit_overlay_changed();
        }
        moved
    }

    pub fn clear_queue(&mut self) {
        if !self.core.overlay.is_empty() {
            self.core.overlay.clear();
            self.core.emit_overlay_changed();
        }
    }

    /// Queued rows in the order they will play
    pub fn overlay_rows(&self) -> Vec<usize> {
        self.core
            .overlay
            .handles()
            .iter()
            .filter_map(|h| self.core.store.position_of(*h))
            .collect()
    }

    /// Overlay position of `row`, if queued
    pub fn queue_position(&self, row: usize) -> Option<usize> {
        self.handle_at(row)
            .and_then(|handle| self.core.overlay.position_of(handle))
    }

    fn handles_for(&self, rows: &[usize]) -> Vec<EntryHandle> {
        rows.iter().filter_map(|&row| self.handle_at(row)).collect()
    }

    // ===== Navigation =====

    /// Row that would play next, without changing anything
    ///
    /// The overlay head wins. Otherwise play order continues from the last
    /// entry that did not come from the overlay. `None` means playback stops.
    pub fn next_row(&self) -> Option<usize> {
        if self.stops_after_current() {
            return None;
        }

        if let Some(row) = self.core.row_of(self.core.overlay.peek_next()) {
            return Some(row);
        }

        self.core.sequencer.next_row(self.natural_position())
    }

    /// Row that would play before the current one
    pub fn previous_row(&self) -> Option<usize> {
        self.core.sequencer.previous_row(self.current_row())
    }

    /// Move to the next row and make it current
    ///
    /// Consumes the overlay head if there is one. Reaching the stop-after
    /// entry clears the marker and stops.
    pub fn advance(&mut self) -> Option<usize> {
        if self.stops_after_current() {
            debug!("Stopping after current entry");
            self.core.stop_after = None;
            self.stopped();
            return None;
        }

        let (row, from_overlay) = match self.core.overlay.pop_next() {
            Some(handle) => {
                self.core.emit_overlay_changed();
                (self.core.store.position_of(handle), true)
            }
            None => (
                self.core.sequencer.next_row(self.natural_position()),
                false,
            ),
        };

        let Some(row) = row else {
            debug!("Reached end of play order");
            return None;
        };

        // Dynamic trimming may shift the row
        self.make_current(row, !from_overlay);
        self.current_row()
    }

    /// Move to the previous row and make it current
    pub fn retreat(&mut self) -> Option<usize> {
        let row = self.previous_row()?;
        self.make_current(row, true);
        self.current_row()
    }

    /// Make `row` the current entry
    ///
    /// The old current entry becomes last-played and a queued row leaves the
    /// overlay. Out-of-range rows are ignored.
    pub fn set_current_row(&mut self, row: usize) -> bool {
        if row >= self.len() {
            warn!(row, len = self.len(), "Ignoring out-of-range current row");
            return false;
        }

        if let Some(handle) = self.handle_at(row) {
            if self.core.overlay.remove_handles(&[handle]) > 0 {
                self.core.emit_overlay_changed();
            }
        }
        self.make_current(row, true);
        true
    }

    /// Forget the current entry
    pub fn clear_current(&mut self) {
        if self.core.current.take().is_some() {
            self.core.anchor = None;
            self.core.emit_current_changed();
        }
    }

    fn make_current(&mut self, row: usize, move_anchor: bool) {
        let Some(handle) = self.handle_at(row) else {
            return;
        };

        if self.core.current != Some(handle) {
            if let Some(previous) = self.core.current {
                self.core.last_played = Some(previous);
            }
        }
        self.core.current = Some(handle);
        if move_anchor || self.core.anchor.is_none() {
            self.core.anchor = Some(Anchor::After(handle));
        }
        self.core.emit_current_changed();

        self.maintain_dynamic(true);
    }

    /// Where play order continues from
    fn natural_position(&self) -> Option<usize> {
        if self.core.sequencer.repeat() == RepeatMode::Track {
            return self.current_row();
        }
        match self.core.anchor {
            Some(Anchor::After(handle)) => self
                .core
                .row_of(Some(handle))
                .or_else(|| self.current_row()),
            Some(Anchor::Start) => None,
            None => self.current_row(),
        }
    }

    fn stops_after_current(&self) -> bool {
        self.core.current.is_some()
            && self.core.stop_after == self.core.current
            && self.current_row().is_some()
    }

    // ===== Shuffle & Repeat =====

    /// Set shuffle mode and draw a new play order led by the current entry
    pub fn set_shuffle(&mut self, mode: ShuffleMode) {
        if self.core.sequencer.shuffle() == mode {
            return;
        }
        self.core.sequencer.set_shuffle(mode);
        self.reseed();
        info!(?mode, "Shuffle mode changed");
    }

    pub fn get_shuffle(&self) -> ShuffleMode {
        self.core.sequencer.shuffle()
    }

    /// Set repeat mode
    pub fn set_repeat(&mut self, mode: RepeatMode) {
        if self.core.sequencer.repeat() == mode {
            return;
        }
        self.core.sequencer.set_repeat(mode);
        self.emit_sequence_changed();
        info!(?mode, "Repeat mode changed");
    }

    pub fn get_repeat(&self) -> RepeatMode {
        self.core.sequencer.repeat()
    }

    /// Draw a new shuffled play order, starting with the current entry
    pub fn reshuffle(&mut self) {
        self.reseed();
    }

    /// Rows in play order
    pub fn virtual_order(&self) -> Vec<usize> {
        self.core.sequencer.rows()
    }

    /// Play order details
    pub fn sequencer(&self) -> &VirtualSequencer {
        &self.core.sequencer
    }

    /// Only entries accepted by `filter` take part in the play order
    pub fn set_filter<F>(&mut self, filter: F)
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.core.filter = Some(Box::new(filter));
        self.core.rebuild_sequence();
    }

    /// Case-insensitive filter on title, artist and album
    ///
    /// Blank text clears the filter.
    pub fn set_text_filter(&mut self, text: &str) {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            self.clear_filter();
            return;
        }
        self.set_filter(move |entry| entry.metadata().matches_text(&needle));
    }

    pub fn clear_filter(&mut self) {
        if self.core.filter.take().is_some() {
            self.core.rebuild_sequence();
        }
    }

    /// Whether `row` takes part in the play order
    pub fn is_row_playable(&self, row: usize) -> bool {
        self.entry_at(row)
            .is_some_and(|entry| entry.is_valid() && self.core.passes_filter(entry))
    }

    fn reseed(&mut self) {
        let seed = self.rng.gen();
        self.core.sequencer.reseed(seed, self.core.current);
        self.core.rebuild_sequence();
        self.emit_sequence_changed();
    }

    fn emit_sequence_changed(&mut self) {
        let shuffle = self.core.sequencer.shuffle();
        let repeat = self.core.sequencer.repeat();
        self.core
            .emit(PlaylistEvent::SequenceChanged { shuffle, repeat });
    }

    // ===== Playback State =====

    /// Toggle "stop after this row"
    pub fn stop_after(&mut self, row: usize) {
        let Some(handle) = self.handle_at(row) else {
            return;
        };

        let previous = self.stop_after_row();
        if self.core.stop_after == Some(handle) {
            self.core.stop_after = None;
        } else {
            self.core.stop_after = Some(handle);
        }

        if let Some(previous) = previous.filter(|&p| p != row) {
            self.core.emit(PlaylistEvent::RowChanged { row: previous });
        }
        self.core.emit(PlaylistEvent::RowChanged { row });
    }

    /// Whether playback stops once the current entry ends
    pub fn stop_after_current(&self) -> bool {
        self.stops_after_current()
    }

    pub fn playing(&mut self) {
        self.set_state(PlaybackState::Playing);
    }

    pub fn paused(&mut self) {
        self.set_state(PlaybackState::Paused);
    }

    pub fn stopped(&mut self) {
        self.set_state(PlaybackState::Stopped);
    }

    pub fn get_state(&self) -> PlaybackState {
        self.core.state
    }

    /// Whether the current entry is shown as paused
    pub fn is_paused(&self) -> bool {
        self.core.state == PlaybackState::Paused
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.core.state == state {
            return;
        }
        self.core.state = state;
        self.core.emit(PlaylistEvent::StateChanged { state });
        if let Some(row) = self.current_row() {
            self.core.emit(PlaylistEvent::RowChanged { row });
        }
    }

    // ===== Library & Metadata =====

    /// Replace metadata of every row holding library item `id`
    pub fn apply_library_update(&mut self, id: LibraryId, metadata: &EntryMetadata) -> usize {
        let rows = self.entries_with_identifier(id);
        self.update_rows(&rows, |entry| {
            entry.set_metadata(metadata.clone());
            entry.set_valid(true);
        });
        rows.len()
    }

    /// Grey out rows whose library items were deleted
    pub fn mark_library_items_deleted(&mut self, ids: &[LibraryId]) -> usize {
        let mut rows: Vec<usize> = ids
            .iter()
            .flat_map(|id| self.entries_with_identifier(*id))
            .collect();
        rows.sort_unstable();
        rows.dedup();

        self.update_rows(&rows, |entry| entry.set_valid(false));
        rows.len()
    }

    /// Tell views to redraw `rows`
    pub fn reload_rows(&mut self, rows: &[usize]) {
        let len = self.len();
        for &row in rows.iter().filter(|&&row| row < len) {
            self.core.emit(PlaylistEvent::RowChanged { row });
        }
    }

    /// Set validity of the current entry if it plays `url`
    pub fn apply_validity_on_current(&mut self, url: &str, valid: bool) -> bool {
        let Some(row) = self.current_row() else {
            return false;
        };
        let matches = self
            .entry_at(row)
            .is_some_and(|e| e.url_str() == url && e.is_valid() != valid);
        if matches {
            self.update_rows(&[row], |entry| entry.set_valid(valid));
        }
        matches
    }

    /// Show stream metadata (radio titles etc.) on the current entry
    pub fn set_stream_metadata(&mut self, url: &str, metadata: EntryMetadata) -> bool {
        let Some(row) = self.current_row() else {
            return false;
        };
        if self.entry_at(row).map(Entry::url_str) != Some(url) {
            return false;
        }
        self.update_rows(&[row], |entry| entry.set_stream_metadata(metadata.clone()));
        true
    }

    /// Drop stream metadata from the current entry
    pub fn clear_stream_metadata(&mut self) -> bool {
        let Some(handle) = self.core.current else {
            return false;
        };
        let cleared = self
            .core
            .store
            .get_mut(handle)
            .is_some_and(Entry::clear_stream_metadata);
        if let (true, Some(row)) = (cleared, self.current_row()) {
            self.core.emit(PlaylistEvent::RowChanged { row });
        }
        cleared
    }

    /// Rate the entry at `row`; the rating is stored in the background
    ///
    /// The rating is clamped to `0.0..=1.0`. Only library entries can be
    /// rated.
    pub fn rate_row(&mut self, row: usize, rating: f32) -> Result<()> {
        let handle = self.handle_at(row).ok_or(PlaylistError::RowOutOfRange(row))?;
        let library_id = self
            .entry_at(row)
            .and_then(Entry::library_id)
            .ok_or(PlaylistError::NotRateable(row))?;

        let rating = rating.clamp(0.0, 1.0);
        debug!(row, rating, "Rating requested");
        self.core.emit(PlaylistEvent::RatingRequested {
            handle,
            library_id,
            rating,
        });
        Ok(())
    }

    /// Update entries in place, one `RowChanged` per row
    fn update_rows(&mut self, rows: &[usize], mut update: impl FnMut(&mut Entry)) {
        let mut validity_changed = false;
        for &row in rows {
            let Some(handle) = self.handle_at(row) else {
                continue;
            };
            let Some(entry) = self.core.store.get_mut(handle) else {
                continue;
            };
            let was_valid = entry.is_valid();
            update(entry);
            validity_changed |= entry.is_valid() != was_valid;
            self.core.emit(PlaylistEvent::RowChanged { row });
        }
        if validity_changed {
            self.core.rebuild_sequence();
        }
    }

    // ===== Background Completions =====

    /// Handle for background work to report back with
    pub fn completion_sender(&self) -> CompletionSender {
        self.completions.sender()
    }

    /// Apply everything background work has posted so far
    ///
    /// Completions for entries no longer in the list are dropped. Returns the
    /// number applied.
    pub fn apply_completions(&mut self) -> usize {
        let mut applied = 0;
        let mut validity_changed = false;

        for completion in self.completions.drain() {
            let Some(row) = self.core.store.position_of(completion.handle) else {
                debug!(handle = %completion.handle, "Dropping stale completion");
                continue;
            };
            let Some(entry) = self.core.store.get_mut(completion.handle) else {
                continue;
            };

            let was_valid = entry.is_valid();
            match completion.kind {
                CompletionKind::MetadataResolved(metadata) => entry.resolve(metadata),
                CompletionKind::ResolutionFailed { reason } => {
                    warn!(row, %reason, "Metadata resolution failed");
                    entry.fail_resolution();
                }
                CompletionKind::RatingSaved { rating } => entry.set_rating(rating),
                CompletionKind::RatingFailed { reason } => {
                    warn!(row, %reason, "Rating was not saved");
                    continue;
                }
            }
            validity_changed |= entry.is_valid() != was_valid;

            self.core.emit(PlaylistEvent::RowChanged { row });
            applied += 1;
        }

        if validity_changed {
            self.core.rebuild_sequence();
        }
        applied
    }

    // ===== Veto Listeners =====

    /// Register a listener; only a weak reference is kept
    pub fn add_veto_listener<L: VetoListener + 'static>(&self, listener: &Arc<L>) -> ListenerId {
        self.veto.register(listener)
    }

    pub fn remove_veto_listener(&self, id: ListenerId) -> bool {
        self.veto.unregister(id)
    }

    /// Shared handle to the listener registry
    pub fn veto_pipeline(&self) -> VetoPipeline {
        self.veto.clone()
    }

    // ===== Dynamic Mode =====

    /// Attach a generator and fill the upcoming window from it
    pub fn turn_on_dynamic(&mut self, generator: Box<dyn Generator>) {
        info!(generator = generator.name(), "Dynamic playlist on");
        self.dynamic.attach(generator);
        self.core
            .emit(PlaylistEvent::DynamicModeChanged { active: true });
        self.maintain_dynamic(false);
    }

    /// Detach the generator; entries already added stay
    pub fn turn_off_dynamic(&mut self) {
        if self.dynamic.detach().is_some() {
            info!("Dynamic playlist off");
            self.core
                .emit(PlaylistEvent::DynamicModeChanged { active: false });
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic.is_active()
    }

    pub fn dynamic_generator_name(&self) -> Option<&str> {
        self.dynamic.generator_name()
    }

    /// Replace upcoming generated rows with a fresh batch
    ///
    /// Rows after the current one that are not queued are dropped for good.
    pub fn repopulate_dynamic(&mut self) {
        if !self.dynamic.is_active() {
            return;
        }

        let start = self.current_row().map_or(0, |row| row + 1);
        let rows: Vec<usize> = (start..self.len())
            .filter(|&row| self.queue_position(row).is_none())
            .collect();
        let dropped = self.discard(&rows).len();
        debug!(dropped, "Repopulating dynamic playlist");

        self.maintain_dynamic(false);
    }

    /// Keep the dynamic window filled, optionally trimming played history
    fn maintain_dynamic(&mut self, trim: bool) {
        if trim {
            let plan = self.dynamic.plan(self.len(), self.current_row());
            if plan.trim > 0 {
                let rows: Vec<usize> = (0..plan.trim).collect();
                self.discard(&rows);
            }
        }

        let plan = self.dynamic.plan(self.len(), self.current_row());
        if plan.request == 0 {
            return;
        }

        match self.dynamic.generate(plan.request) {
            Ok(batch) => {
                debug!(requested = plan.request, got = batch.len(), "Dynamic refill");
                self.insert(batch);
            }
            Err(e) => {
                self.core.emit(PlaylistEvent::Notice {
                    message: e.to_string(),
                });
                self.core
                    .emit(PlaylistEvent::DynamicModeChanged { active: false });
            }
        }
    }

    // ===== Persistence =====

    /// Capture entries and sequencing settings
    pub fn snapshot(&self) -> PlaylistSnapshot {
        PlaylistSnapshot {
            entries: self.core.store.iter().cloned().collect(),
            current_row: self.current_row(),
            shuffle: self.get_shuffle(),
            repeat: self.get_repeat(),
        }
    }

    /// Replace the whole playlist with a saved one
    ///
    /// Restored entries skip the veto listeners and the undo history starts
    /// empty.
    pub fn restore(&mut self, snapshot: PlaylistSnapshot) {
        let orphans = self.log.clear();
        self.core.release(&orphans);
        self.discard(&(0..self.len()).collect::<Vec<_>>());
        self.clear_queue();

        self.core.current = None;
        self.core.last_played = None;
        self.core.stop_after = None;
        self.core.anchor = None;

        self.core.sequencer.set_shuffle(snapshot.shuffle);
        self.core.sequencer.set_repeat(snapshot.repeat);

        let count = snapshot.entries.len();
        let handles: Vec<EntryHandle> = snapshot
            .entries
            .into_iter()
            .map(|entry| self.core.store.allocate(entry))
            .collect();
        self.core.insert_without_undo(&handles, 0);

        if let Some(handle) = snapshot.current_row.and_then(|row| self.handle_at(row)) {
            self.core.current = Some(handle);
            self.core.anchor = Some(Anchor::After(handle));
        }
        self.reseed();
        self.core.emit_current_changed();

        info!(id = self.id, count, "Playlist restored");
        self.core.emit(PlaylistEvent::RestoreFinished { count });
    }

    /// Save through `backend` under this playlist's id
    pub async fn save_to(&self, backend: &dyn PlaylistBackend) -> Result<()> {
        let snapshot = self.snapshot();
        backend.save(self.id, &snapshot).await?;
        debug!(id = self.id, entries = snapshot.entries.len(), "Playlist saved");
        Ok(())
    }

    /// Load this playlist's saved state from `backend`
    ///
    /// Returns false (and changes nothing) if nothing was saved.
    pub async fn restore_from(&mut self, backend: &dyn PlaylistBackend) -> Result<bool> {
        match backend.restore(self.id).await? {
            Some(snapshot) => {
                self.restore(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ===== Drag & Drop =====

    /// Handle a drop before `row`
    ///
    /// Rows from this playlist are moved; outside entries are inserted and
    /// played. Returns the number of rows moved or inserted.
    pub fn accept_drop(&mut self, payload: TransferPayload, row: usize) -> usize {
        let row = row.min(self.len());
        match payload {
            TransferPayload::Rows(rows) => {
                let mut rows: Vec<usize> = rows.into_iter().filter(|&r| r < self.len()).collect();
                rows.sort_unstable();
                rows.dedup();

                let dest = drop_destination(&rows, row);
                if self.move_rows(&rows, dest) {
                    rows.len()
                } else {
                    0
                }
            }
            TransferPayload::PlayNow(entries) => {
                self.insert_with(entries, InsertOptions::at(row).play_now())
            }
        }
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Events come out in the order the playlist changed.
    pub fn drain_events(&mut self) -> Vec<PlaylistEvent> {
        std::mem::take(&mut self.core.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.core.pending_events.is_empty()
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new(0, PlaylistConfig::default())
    }
}
