//! Playlist internals shared by the facade and the undo commands
//!
//! [`PlaylistCore`] bundles the entry store with everything that must stay
//! consistent with it: the play-next overlay, the play order and the
//! current / last-played / stop-after pointers. Every structural change goes
//! through its [`Editable`] implementation, which also does the bookkeeping
//! that has to happen in the same step (overlay cleanup, play order rebuild,
//! change events).

use crate::commands::Editable;
use crate::events::{ChangeKind, PlaylistEvent};
use crate::handle::EntryHandle;
use crate::queue::QueueOverlay;
use crate::sequence::VirtualSequencer;
use crate::store::EntryStore;
use crate::types::{Entry, PlaybackState};
use std::ops::Range;
use tracing::debug;

/// Predicate choosing which entries take part in the play order
pub type EntryFilter = Box<dyn Fn(&Entry) -> bool + Send + Sync>;

/// Where natural order continues once the overlay is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// Continue with whatever follows this entry
    After(EntryHandle),
    /// Continue from the start of the play order
    Start,
}

pub(crate) struct PlaylistCore {
    pub store: EntryStore,
    pub overlay: QueueOverlay,
    pub sequencer: VirtualSequencer,

    pub current: Option<EntryHandle>,
    pub last_played: Option<EntryHandle>,
    pub stop_after: Option<EntryHandle>,

    pub anchor: Option<Anchor>,

    pub state: PlaybackState,
    pub filter: Option<EntryFilter>,

    // Event queue for views and collaborators
    pub pending_events: Vec<PlaylistEvent>,
}

impl PlaylistCore {
    pub fn new(sequencer: VirtualSequencer) -> Self {
        Self {
            store: EntryStore::new(),
            overlay: QueueOverlay::new(),
            sequencer,
            current: None,
            last_played: None,
            stop_after: None,
            anchor: None,
            state: PlaybackState::Stopped,
            filter: None,
            pending_events: Vec::new(),
        }
    }

    // ===== Pointers =====

    pub fn row_of(&self, handle: Option<EntryHandle>) -> Option<usize> {
        handle.and_then(|h| self.store.position_of(h))
    }

    pub fn current_row(&self) -> Option<usize> {
        self.row_of(self.current)
    }

    /// Free detached entries for good and unset pointers to them
    pub fn release(&mut self, handles: &[EntryHandle]) -> Vec<Entry> {
        let mut released = Vec::with_capacity(handles.len());
        for &handle in handles {
            let Some(entry) = self.store.release(handle) else {
                continue;
            };
            released.push(entry);
            for pointer in [&mut self.current, &mut self.last_played, &mut self.stop_after] {
                if *pointer == Some(handle) {
                    *pointer = None;
                }
            }
            if self.anchor == Some(Anchor::After(handle)) {
                self.anchor = None;
            }
        }
        if !released.is_empty() {
            debug!(count = released.len(), "Released detached entries");
        }
        released
    }

    // ===== Play order =====

    pub fn rebuild_sequence(&mut self) {
        match &self.filter {
            Some(filter) => self.sequencer.rebuild(&self.store, filter.as_ref()),
            None => self.sequencer.rebuild(&self.store, &|_: &Entry| true),
        }
    }

    /// Whether `entry` passes the active filter
    pub fn passes_filter(&self, entry: &Entry) -> bool {
        match &self.filter {
            Some(filter) => filter(entry),
            None => true,
        }
    }

    // ===== Events =====

    pub fn emit(&mut self, event: PlaylistEvent) {
        self.pending_events.push(event);
    }

    pub fn emit_overlay_changed(&mut self) {
        let length = self.overlay.len();
        self.emit(PlaylistEvent::OverlayChanged { length });
    }

    pub fn emit_current_changed(&mut self) {
        let row = self.current_row();
        self.emit(PlaylistEvent::CurrentChanged { row });
    }

    /// Ask for metadata of pending URL entries among `handles`
    fn request_metadata(&mut self, handles: &[EntryHandle]) {
        let requests: Vec<PlaylistEvent> = handles
            .iter()
            .filter_map(|&handle| {
                let entry = self.store.get(handle)?;
                entry.is_pending().then(|| PlaylistEvent::MetadataRequested {
                    handle,
                    url: entry.url_str().to_string(),
                })
            })
            .collect();
        self.pending_events.extend(requests);
    }

    /// Keep the anchor on an attached entry while overlay entries play
    ///
    /// A detached anchor hands over to the closest surviving entry before it
    /// in play order, so natural order still resumes where it would have.
    fn relocate_anchor(&mut self, detached: &[EntryHandle]) {
        let Some(Anchor::After(anchor)) = self.anchor else {
            return;
        };
        if self.current == Some(anchor) || !detached.contains(&anchor) {
            return;
        }

        let order = self.sequencer.handles();
        let Some(index) = order.iter().position(|&h| h == anchor) else {
            self.anchor = None;
            return;
        };
        self.anchor = match order[..index].iter().rev().find(|&&h| !detached.contains(&h)) {
            Some(&survivor) => Some(Anchor::After(survivor)),
            None => Some(Anchor::Start),
        };
    }

    /// Bookkeeping after a structural change
    fn structure_changed(
        &mut self,
        kind: ChangeKind,
        range: Range<usize>,
        detached: &[EntryHandle],
        previous_current: Option<usize>,
    ) {
        self.emit(PlaylistEvent::ListChanged { kind, range });

        if !detached.is_empty() && self.overlay.remove_handles(detached) > 0 {
            self.emit_overlay_changed();
        }

        // Play order still reflects the rows before the change here
        self.relocate_anchor(detached);
        self.rebuild_sequence();

        if self.current_row() != previous_current {
            self.emit_current_changed();
        }
    }
}

impl Editable for PlaylistCore {
    fn store(&self) -> &EntryStore {
        &self.store
    }

    fn insert_without_undo(&mut self, handles: &[EntryHandle], at: usize) -> Range<usize> {
        let previous_current = self.current_row();
        let range = self.store.insert(handles, at);
        if range.is_empty() {
            return range;
        }

        debug!(rows = ?range, "Inserted entries");
        self.structure_changed(ChangeKind::Inserted, range.clone(), &[], previous_current);
        self.request_metadata(handles);
        range
    }

    fn remove_without_undo(&mut self, rows: &[usize]) -> Vec<(usize, EntryHandle)> {
        let previous_current = self.current_row();
        let removed = self.store.remove(rows);
        let (Some(first), Some(last)) = (removed.first(), removed.last()) else {
            return removed;
        };

        let range = first.0..last.0 + 1;
        debug!(count = removed.len(), rows = ?range, "Removed entries");

        let detached: Vec<EntryHandle> = removed.iter().map(|(_, handle)| *handle).collect();
        self.structure_changed(ChangeKind::Removed, range, &detached, previous_current);
        removed
    }

    fn move_without_undo(&mut self, rows: &[usize], dest: usize) -> Range<usize> {
        let previous_current = self.current_row();
        let first_source = rows.iter().copied().filter(|&r| r < self.store.len()).min();
        let last_source = rows.iter().copied().filter(|&r| r < self.store.len()).max();

        let range = self.store.move_rows(rows, dest);
        let (Some(first), Some(last)) = (first_source, last_source) else {
            return range;
        };

        let affected = first.min(range.start)..(last + 1).max(range.end);
        debug!(to = ?range, "Moved entries");
        self.structure_changed(ChangeKind::Moved, affected, &[], previous_current);
        range
    }

    fn restore_without_undo(&mut self, pairs: &[(usize, EntryHandle)]) {
        let previous_current = self.current_row();
        let Some(range) = self.store.restore(pairs) else {
            return;
        };

        debug!(count = pairs.len(), rows = ?range, "Restored entries");
        self.structure_changed(ChangeKind::Inserted, range, &[], previous_current);

        let handles: Vec<EntryHandle> = pairs.iter().map(|(_, handle)| *handle).collect();
        self.request_metadata(&handles);
    }

    fn place_without_undo(&mut self, handles: &[EntryHandle], targets: &[usize]) {
        let previous_current = self.current_row();
        let rows: Vec<usize> = handles
            .iter()
            .filter_map(|h| self.store.position_of(*h))
            .collect();
        self.store.place(handles, targets);

        let bounds = rows.iter().chain(targets).copied();
        let (Some(first), Some(last)) = (bounds.clone().min(), bounds.max()) else {
            return;
        };
        let last = last.min(self.store.len().saturating_sub(1));

        self.structure_changed(ChangeKind::Moved, first..last + 1, &[], previous_current);
    }

    fn reorder_without_undo(&mut self, order: &[EntryHandle]) {
        let previous_current = self.current_row();
        self.store.reorder(order);

        let len = self.store.len();
        self.structure_changed(ChangeKind::Reordered, 0..len, &[], previous_current);
    }
}
