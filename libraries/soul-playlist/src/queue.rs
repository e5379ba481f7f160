//! Play-next queue overlay
//!
//! An ordered list of entries the user asked to hear next. While it is not
//! empty the head of the overlay wins over the natural play order:
//!
//! ```text
//! Current: Track A
//! ─────────────────────────────
//! Overlay (consumed from the front):
//!   - Track F
//!   - Track C
//! ─────────────────────────────
//! Natural order continues after the anchor:
//!   - Track B
//!   - Track D
//! ```
//!
//! The overlay stores [`EntryHandle`]s, so it follows entries through
//! structural edits and never holds a row index that could go stale.

use crate::handle::EntryHandle;

/// Ordered play-next overlay
#[derive(Debug, Clone, Default)]
pub struct QueueOverlay {
    items: Vec<EntryHandle>,
}

impl QueueOverlay {
    /// Create new empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries to the end of the overlay
    ///
    /// Entries already queued keep their place.
    pub fn add_to_end(&mut self, handles: &[EntryHandle]) -> usize {
        let before = self.items.len();
        for &handle in handles {
            if !self.items.contains(&handle) {
                self.items.push(handle);
            }
        }
        self.items.len() - before
    }

    /// Put entries at the front of the overlay, preserving their order
    ///
    /// Entries already queued are moved to the front.
    pub fn add_next(&mut self, handles: &[EntryHandle]) {
        self.items.retain(|h| !handles.contains(h));
        let mut front: Vec<EntryHandle> = Vec::with_capacity(handles.len());
        for &handle in handles {
            if !front.contains(&handle) {
                front.push(handle);
            }
        }
        self.items.splice(0..0, front);
    }

    /// Drop the given entries from the overlay
    ///
    /// Returns the number of entries removed.
    pub fn remove_handles(&mut self, handles: &[EntryHandle]) -> usize {
        let before = self.items.len();
        self.items.retain(|h| !handles.contains(h));
        before - self.items.len()
    }

    /// Drop every entry for which `keep` returns false
    pub fn retain(&mut self, keep: impl FnMut(&EntryHandle) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    /// Consume the head of the overlay
    pub fn pop_next(&mut self) -> Option<EntryHandle> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Head of the overlay without consuming it
    pub fn peek_next(&self) -> Option<EntryHandle> {
        self.items.first().copied()
    }

    /// Zero-based overlay position of `handle`
    pub fn position_of(&self, handle: EntryHandle) -> Option<usize> {
        self.items.iter().position(|h| *h == handle)
    }

    pub fn contains(&self, handle: EntryHandle) -> bool {
        self.items.contains(&handle)
    }

    /// Move the overlay item at `from` to `to`
    ///
    /// Returns false when either index is out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        if from != to {
            let handle = self.items.remove(from);
            self.items.insert(to, handle);
        }
        true
    }

    /// Queued handles in play order
    pub fn handles(&self) -> &[EntryHandle] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
