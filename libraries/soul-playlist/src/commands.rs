//! Reversible playlist edits
//!
//! Commands only touch the playlist through [`Editable`], the one interface
//! that can change row structure. Everything outside this module and
//! `core` sees the read-only [`EntryStore`] API.
//!
//! Commands record handles, not rows. Rows are looked up again every time a
//! command runs, so a command stays correct however the list was edited
//! between its recording and its replay.

use crate::handle::EntryHandle;
use crate::store::EntryStore;
use std::ops::Range;

/// Privileged structural access used by commands and system-driven edits
///
/// The `_without_undo` methods change rows directly and emit the matching
/// change notifications, but record nothing in the undo history.
pub(crate) trait Editable {
    fn store(&self) -> &EntryStore;

    /// Attach detached entries as a block before `at`
    fn insert_without_undo(&mut self, handles: &[EntryHandle], at: usize) -> Range<usize>;

    /// Detach rows; returns `(row, handle)` in ascending row order
    fn remove_without_undo(&mut self, rows: &[usize]) -> Vec<(usize, EntryHandle)>;

    /// Move rows so the block starts at post-removal `dest`
    fn move_without_undo(&mut self, rows: &[usize], dest: usize) -> Range<usize>;

    /// Re-attach detached entries at recorded rows
    fn restore_without_undo(&mut self, pairs: &[(usize, EntryHandle)]);

    /// Put attached entries back at recorded rows
    fn place_without_undo(&mut self, handles: &[EntryHandle], targets: &[usize]);

    /// Replace the row order
    fn reorder_without_undo(&mut self, order: &[EntryHandle]);
}

/// Why the row order was replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReorderKind {
    Sort,
    Shuffle,
}

/// One undoable edit
#[derive(Debug, Clone)]
pub(crate) enum Command {
    Insert {
        handles: Vec<EntryHandle>,
        at: usize,
    },
    Remove {
        /// Removed entries and the rows they left, refreshed on each run
        removed: Vec<(usize, EntryHandle)>,
    },
    Move {
        /// Moved entries, in ascending original row order
        handles: Vec<EntryHandle>,
        original: Vec<usize>,
        dest: usize,
    },
    Reorder {
        before: Vec<EntryHandle>,
        after: Vec<EntryHandle>,
        kind: ReorderKind,
    },
}

impl Command {
    /// Insert detached entries before `at`
    pub fn insert(handles: Vec<EntryHandle>, at: usize) -> Self {
        Self::Insert { handles, at }
    }

    /// Remove `rows` (any order; duplicates and bad rows ignored)
    pub fn remove(store: &EntryStore, rows: &[usize]) -> Self {
        let mut rows: Vec<usize> = rows.iter().copied().filter(|&r| r < store.len()).collect();
        rows.sort_unstable();
        rows.dedup();
        let removed = rows
            .into_iter()
            .filter_map(|row| store.handle_at(row).map(|handle| (row, handle)))
            .collect();
        Self::Remove { removed }
    }

    /// Move `rows` so they start at `dest` in the list without them
    pub fn move_rows(store: &EntryStore, rows: &[usize], dest: usize) -> Self {
        let mut original: Vec<usize> = rows.iter().copied().filter(|&r| r < store.len()).collect();
        original.sort_unstable();
        original.dedup();
        let handles = original.iter().filter_map(|&r| store.handle_at(r)).collect();
        Self::Move {
            handles,
            original,
            dest,
        }
    }

    /// Replace the current order with `after`
    pub fn reorder(store: &EntryStore, after: Vec<EntryHandle>, kind: ReorderKind) -> Self {
        Self::Reorder {
            before: store.handles().to_vec(),
            after,
            kind,
        }
    }

    /// Whether running the command would change nothing
    pub fn is_noop(&self, store: &EntryStore) -> bool {
        match self {
            Command::Insert { handles, .. } => handles.is_empty(),
            Command::Remove { removed } => removed.is_empty(),
            Command::Move {
                original, dest, ..
            } => {
                if original.is_empty() {
                    return true;
                }
                // A contiguous block put back where it started
                let dest = (*dest).min(store.len() - original.len());
                original
                    .iter()
                    .enumerate()
                    .all(|(i, &row)| row == dest + i)
            }
            Command::Reorder { before, after, .. } => before == after,
        }
    }

    /// Apply (or re-apply) the command
    pub fn redo(&mut self, target: &mut impl Editable) {
        match self {
            Command::Insert { handles, at } => {
                target.insert_without_undo(handles, *at);
            }
            Command::Remove { removed } => {
                let positions: Vec<usize> = removed
                    .iter()
                    .filter_map(|(_, h)| target.store().position_of(*h))
                    .collect();
                // Entries released since the last run stay gone
                let now = target.remove_without_undo(&positions);
                if !now.is_empty() {
                    *removed = now;
                }
            }
            Command::Move { handles, dest, .. } => {
                let positions: Vec<usize> = handles
                    .iter()
                    .filter_map(|h| target.store().position_of(*h))
                    .collect();
                target.move_without_undo(&positions, *dest);
            }
            Command::Reorder { after, .. } => target.reorder_without_undo(after),
        }
    }

    /// Revert the command
    pub fn undo(&mut self, target: &mut impl Editable) {
        match self {
            Command::Insert { handles, .. } => {
                let positions: Vec<usize> = handles
                    .iter()
                    .filter_map(|h| target.store().position_of(*h))
                    .collect();
                target.remove_without_undo(&positions);
            }
            Command::Remove { removed } => target.restore_without_undo(removed),
            Command::Move {
                handles, original, ..
            } => target.place_without_undo(handles, original),
            Command::Reorder { before, .. } => target.reorder_without_undo(before),
        }
    }

    /// Detached entries only this command can bring back
    ///
    /// When the command is dropped from the history these entries are gone
    /// for good. `done` tells whether the command is currently applied.
    pub fn orphans(&self, done: bool) -> Vec<EntryHandle> {
        match self {
            Command::Insert { handles, .. } if !done => handles.clone(),
            Command::Remove { removed } if done => {
                removed.iter().map(|(_, handle)| *handle).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Text shown next to undo/redo
    pub fn description(&self) -> String {
        match self {
            Command::Insert { handles, .. } => format!("Add {}", songs(handles.len())),
            Command::Remove { removed } => format!("Remove {}", songs(removed.len())),
            Command::Move { .. } => "Move songs".to_string(),
            Command::Reorder {
                kind: ReorderKind::Sort,
                ..
            } => "Sort songs".to_string(),
            Command::Reorder {
                kind: ReorderKind::Shuffle,
                ..
            } => "Shuffle playlist".to_string(),
        }
    }
}

fn songs(count: usize) -> String {
    if count == 1 {
        "1 song".to_string()
    } else {
        format!("{count} songs")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{Entry, EntryMetadata};

    /// Bare store with no side effects, for exercising commands alone
    #[derive(Default)]
    pub(crate) struct Bare {
        pub store: EntryStore,
    }

    impl Bare {
        pub fn with(titles: &[&str]) -> Self {
            let mut bare = Self::default();
            let handles: Vec<EntryHandle> = titles
                .iter()
                .map(|t| {
                    bare.store.allocate(Entry::song(EntryMetadata {
                        title: (*t).to_string(),
                        ..Default::default()
                    }))
                })
                .collect();
            bare.store.insert(&handles, 0);
            bare
        }

        pub fn titles(&self) -> Vec<String> {
            self.store
                .iter()
                .map(|e| e.metadata().title.clone())
                .collect()
        }
    }

    impl Editable for Bare {
        fn store(&self) -> &EntryStore {
            &self.store
        }

        fn insert_without_undo(&mut self, handles: &[EntryHandle], at: usize) -> Range<usize> {
            self.store.insert(handles, at)
        }

        fn remove_without_undo(&mut self, rows: &[usize]) -> Vec<(usize, EntryHandle)> {
            self.store.remove(rows)
        }

        fn move_without_undo(&mut self, rows: &[usize], dest: usize) -> Range<usize> {
            self.store.move_rows(rows, dest)
        }

        fn restore_without_undo(&mut self, pairs: &[(usize, EntryHandle)]) {
            self.store.restore(pairs);
        }

        fn place_without_undo(&mut self, handles: &[EntryHandle], targets: &[usize]) {
            self.store.place(handles, targets);
        }

        fn reorder_without_undo(&mut self, order: &[EntryHandle]) {
            self.store.reorder(order);
        }
    }

    #[test]
    fn remove_then_undo_restores_positions() {
        let mut bare = Bare::with(&["A", "B", "C", "D", "E"]);
        let mut cmd = Command::remove(&bare.store, &[3, 1]);

        cmd.redo(&mut bare);
        assert_eq!(bare.titles(), vec!["A", "C", "E"]);

        cmd.undo(&mut bare);
        assert_eq!(bare.titles(), vec!["A", "B", "C", "D", "E"]);

        cmd.redo(&mut bare);
        assert_eq!(bare.titles(), vec!["A", "C", "E"]);
    }

    #[test]
    fn redo_never_falls_back_to_rows() {
        let mut bare = Bare::with(&["A", "B", "C", "D"]);
        let b = bare.store.handle_at(1).unwrap();
        let mut cmd = Command::remove(&bare.store, &[1]);

        cmd.redo(&mut bare);
        cmd.undo(&mut bare);

        // B goes for good outside the history
        bare.store.remove(&[1]);
        assert!(bare.store.release(b).is_some());

        cmd.redo(&mut bare);
        cmd.undo(&mut bare);
        cmd.redo(&mut bare);
        assert_eq!(bare.titles(), vec!["A", "C", "D"]);
    }

    #[test]
    fn move_round_trip() {
        let mut bare = Bare::with(&["A", "B", "C", "D"]);
        let mut cmd = Command::move_rows(&bare.store, &[0], 2);
        assert!(!cmd.is_noop(&bare.store));

        cmd.redo(&mut bare);
        assert_eq!(bare.titles(), vec!["B", "C", "A", "D"]);

        cmd.undo(&mut bare);
        assert_eq!(bare.titles(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn insert_undo_detaches_entries() {
        let mut bare = Bare::with(&["A"]);
        let x = bare.store.allocate(Entry::url("x"));
        let mut cmd = Command::insert(vec![x], 0);

        cmd.redo(&mut bare);
        assert_eq!(bare.store.position_of(x), Some(0));
        assert!(cmd.orphans(true).is_empty());

        cmd.undo(&mut bare);
        assert_eq!(bare.store.position_of(x), None);
        assert_eq!(cmd.orphans(false), vec![x]);
    }

    #[test]
    fn noop_detection() {
        let bare = Bare::with(&["A", "B", "C"]);
        assert!(Command::move_rows(&bare.store, &[1], 1).is_noop(&bare.store));
        assert!(Command::move_rows(&bare.store, &[1, 2], 9).is_noop(&bare.store));
        assert!(!Command::move_rows(&bare.store, &[0, 2], 0).is_noop(&bare.store));
        assert!(Command::remove(&bare.store, &[7]).is_noop(&bare.store));
        assert!(Command::insert(Vec::new(), 0).is_noop(&bare.store));
    }

    #[test]
    fn descriptions() {
        let bare = Bare::with(&["A", "B"]);
        assert_eq!(Command::remove(&bare.store, &[0]).description(), "Remove 1 song");
        assert_eq!(
            Command::remove(&bare.store, &[0, 1]).description(),
            "Remove 2 songs"
        );
        assert_eq!(
            Command::reorder(&bare.store, Vec::new(), ReorderKind::Shuffle).description(),
            "Shuffle playlist"
        );
    }
}
