//! Entry storage
//!
//! Owns every entry, the dense row order, and the library-id reverse index.
//!
//! Entries live in a [`HandleTable`]; the row vector only holds handles. An
//! entry taken out of the rows is *detached*, not freed, so an undo command
//! can put the very same entry (same handle) back. Detached entries are freed
//! with [`EntryStore::release`] once nothing can restore them.
//!
//! Reads are public. Structural mutation is crate-private and only reached
//! through the playlist's editing capability (see `commands::Editable`).

use crate::handle::{EntryHandle, HandleTable};
use crate::types::{Entry, LibraryId};
use std::collections::HashMap;
use std::ops::Range;

#[derive(Debug, Clone)]
struct Stored {
    entry: Entry,
    /// Current row, `None` while detached
    row: Option<usize>,
}

/// Ordered entry storage with stable handles
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    rows: Vec<EntryHandle>,
    table: HandleTable<Stored>,
    by_library_id: HashMap<LibraryId, Vec<EntryHandle>>,
}

impl EntryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Same as [`EntryStore::len`]
    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entry at `row`
    pub fn entry_at(&self, row: usize) -> Option<&Entry> {
        self.handle_at(row).and_then(|h| self.get(h))
    }

    /// Handle of the entry at `row`
    pub fn handle_at(&self, row: usize) -> Option<EntryHandle> {
        self.rows.get(row).copied()
    }

    /// Attached entry behind `handle`
    pub fn get(&self, handle: EntryHandle) -> Option<&Entry> {
        self.table
            .get(handle)
            .filter(|stored| stored.row.is_some())
            .map(|stored| &stored.entry)
    }

    /// Current row of `handle`, `None` if detached or released
    pub fn position_of(&self, handle: EntryHandle) -> Option<usize> {
        self.table.get(handle).and_then(|stored| stored.row)
    }

    /// Whether `handle` still refers to an entry (attached or detached)
    pub fn is_alive(&self, handle: EntryHandle) -> bool {
        self.table.contains(handle)
    }

    /// Rows holding entries for library item `id`, ascending
    pub fn find_by_identifier(&self, id: LibraryId) -> Vec<usize> {
        let mut rows: Vec<usize> = self
            .by_library_id
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|h| self.position_of(*h))
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Handles in row order
    pub fn handles(&self) -> &[EntryHandle] {
        &self.rows
    }

    /// Entries in row order
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.rows.iter().filter_map(|h| self.get(*h))
    }

    /// Number of entries held, attached or detached
    pub fn allocated(&self) -> usize {
        self.table.len()
    }

    // ===== Crate-private mutation =====

    /// Store an entry without placing it in any row
    pub(crate) fn allocate(&mut self, entry: Entry) -> EntryHandle {
        self.table.insert(Stored { entry, row: None })
    }

    /// Free a detached entry
    ///
    /// Attached entries are left untouched and `None` is returned.
    pub(crate) fn release(&mut self, handle: EntryHandle) -> Option<Entry> {
        if self.table.get(handle)?.row.is_some() {
            return None;
        }
        self.table.remove(handle).map(|stored| stored.entry)
    }

    /// Mutable access for in-place metadata updates
    pub(crate) fn get_mut(&mut self, handle: EntryHandle) -> Option<&mut Entry> {
        self.table
            .get_mut(handle)
            .filter(|stored| stored.row.is_some())
            .map(|stored| &mut stored.entry)
    }

    /// Attach detached entries as a block before row `at`
    ///
    /// `at` past the end appends. Handles that are attached or dead are
    /// skipped. Returns the rows now occupied by the block.
    pub(crate) fn insert(&mut self, handles: &[EntryHandle], at: usize) -> Range<usize> {
        let at = at.min(self.rows.len());
        let block: Vec<EntryHandle> = handles
            .iter()
            .copied()
            .filter(|h| self.table.get(*h).is_some_and(|s| s.row.is_none()))
            .collect();

        let count = block.len();
        for handle in &block {
            self.index(*handle);
        }
        self.rows.splice(at..at, block);
        self.renumber_from(at);

        at..at + count
    }

    /// Attach each `(row, handle)` pair at its row
    ///
    /// Pairs are applied in ascending row order, so rows recorded before a
    /// removal come back exactly where they were. Rows are clamped.
    pub(crate) fn restore(&mut self, pairs: &[(usize, EntryHandle)]) -> Option<Range<usize>> {
        let mut pairs: Vec<(usize, EntryHandle)> = pairs
            .iter()
            .copied()
            .filter(|(_, h)| self.table.get(*h).is_some_and(|s| s.row.is_none()))
            .collect();
        pairs.sort_by_key(|(row, _)| *row);

        let mut first = None;
        let mut last = 0;
        for (row, handle) in pairs {
            let row = row.min(self.rows.len());
            self.index(handle);
            self.rows.insert(row, handle);
            first.get_or_insert(row);
            last = last.max(row);
        }

        let first = first?;
        self.renumber_from(first);
        Some(first..last + 1)
    }

    /// Detach the entries at `positions`
    ///
    /// Positions may come in any order; duplicates and out-of-range values are
    /// ignored. Rows are taken out highest first so the remaining positions
    /// stay valid. Returns `(original_row, handle)` in ascending row order.
    pub(crate) fn remove(&mut self, positions: &[usize]) -> Vec<(usize, EntryHandle)> {
        let removed = self.take_rows(positions);
        for (_, handle) in &removed {
            self.unindex(*handle);
        }
        removed
    }

    /// Move the entries at `sources` so the block starts at `dest`
    ///
    /// `dest` is measured in the list *after* the sources were taken out and
    /// is clamped to its length. Moved entries keep their relative order.
    /// Returns the rows now occupied by the block.
    pub(crate) fn move_rows(&mut self, sources: &[usize], dest: usize) -> Range<usize> {
        let taken = self.take_rows(sources);
        if taken.is_empty() {
            return 0..0;
        }

        let first_source = taken[0].0;
        let dest = dest.min(self.rows.len());
        let count = taken.len();
        self.rows
            .splice(dest..dest, taken.into_iter().map(|(_, handle)| handle));
        self.renumber_from(first_source.min(dest));

        dest..dest + count
    }

    /// Put attached `handles` back at `targets` (ascending original rows)
    ///
    /// `handles[i]` lands on `targets[i]`. Used to invert a move.
    pub(crate) fn place(&mut self, handles: &[EntryHandle], targets: &[usize]) {
        let positions: Vec<usize> = handles
            .iter()
            .filter_map(|h| self.position_of(*h))
            .collect();
        let taken = self.take_rows(&positions);

        // take_rows hands back row order; pair by identity so each handle
        // gets its own target.
        let mut pairs: Vec<(usize, EntryHandle)> = handles
            .iter()
            .copied()
            .zip(targets.iter().copied())
            .filter(|(h, _)| taken.iter().any(|(_, t)| t == h))
            .map(|(h, row)| (row, h))
            .collect();
        pairs.sort_by_key(|(row, _)| *row);

        let mut first = usize::MAX;
        for (row, handle) in pairs {
            let row = row.min(self.rows.len());
            self.rows.insert(row, handle);
            first = first.min(row);
        }
        if let Some(min_taken) = taken.first().map(|(row, _)| *row) {
            self.renumber_from(first.min(min_taken));
        }
    }

    /// Replace the row order with `order`
    ///
    /// `order` should be a permutation of the attached handles. Entries it
    /// names that are not attached are skipped; attached entries it misses
    /// keep their relative order at the end.
    pub(crate) fn reorder(&mut self, order: &[EntryHandle]) {
        let mut seen = std::collections::HashSet::with_capacity(order.len());
        let mut rows: Vec<EntryHandle> = order
            .iter()
            .copied()
            .filter(|h| self.position_of(*h).is_some() && seen.insert(*h))
            .collect();
        rows.extend(self.rows.iter().copied().filter(|h| !seen.contains(h)));

        self.rows = rows;
        self.renumber_from(0);
    }

    // ===== Internals =====

    fn take_rows(&mut self, positions: &[usize]) -> Vec<(usize, EntryHandle)> {
        let mut sorted: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&row| row < self.rows.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut taken = Vec::with_capacity(sorted.len());
        for &row in sorted.iter().rev() {
            let handle = self.rows.remove(row);
            if let Some(stored) = self.table.get_mut(handle) {
                stored.row = None;
            }
            taken.push((row, handle));
        }
        taken.reverse();

        if let Some(&(first, _)) = taken.first() {
            self.renumber_from(first);
        }
        taken
    }

    fn renumber_from(&mut self, start: usize) {
        for (row, handle) in self.rows.iter().enumerate().skip(start) {
            if let Some(stored) = self.table.get_mut(*handle) {
                stored.row = Some(row);
            }
        }
    }

    fn index(&mut self, handle: EntryHandle) {
        if let Some(id) = self.table.get(handle).and_then(|s| s.entry.library_id()) {
            self.by_library_id.entry(id).or_default().push(handle);
        }
    }

    fn unindex(&mut self, handle: EntryHandle) {
        let Some(id) = self.table.get(handle).and_then(|s| s.entry.library_id()) else {
            return;
        };
        if let Some(handles) = self.by_library_id.get_mut(&id) {
            handles.retain(|h| *h != handle);
            if handles.is_empty() {
                self.by_library_id.remove(&id);
            }
        }
    }
}
