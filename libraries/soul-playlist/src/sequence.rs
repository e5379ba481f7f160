//! Play-order computation
//!
//! [`VirtualSequencer`] maps the natural row order of an [`EntryStore`] to the
//! order entries are played in, for a given shuffle and repeat mode.
//!
//! The sequence is always rebuilt from scratch. Shuffle positions are derived
//! from a seed and each entry's stable handle, so rebuilding after an edit
//! keeps every surviving entry in the same relative place instead of
//! reshuffling the whole list.

use crate::handle::EntryHandle;
use crate::store::EntryStore;
use crate::types::{Entry, RepeatMode, ShuffleMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy)]
struct Item {
    row: usize,
    handle: EntryHandle,
    group: u64,
}

/// Play order of a playlist under a shuffle and repeat policy
#[derive(Debug, Clone)]
pub struct VirtualSequencer {
    shuffle: ShuffleMode,
    repeat: RepeatMode,
    seed: u64,

    /// Entry kept at the front of a shuffled order (what was playing when the
    /// order was drawn)
    lead: Option<EntryHandle>,

    items: Vec<Item>,
    virtual_of_row: HashMap<usize, usize>,
}

impl VirtualSequencer {
    /// Create an empty sequencer
    pub fn new(shuffle: ShuffleMode, repeat: RepeatMode, seed: u64) -> Self {
        Self {
            shuffle,
            repeat,
            seed,
            lead: None,
            items: Vec::new(),
            virtual_of_row: HashMap::new(),
        }
    }

    pub fn shuffle(&self) -> ShuffleMode {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Change shuffle mode (takes effect on the next rebuild)
    pub fn set_shuffle(&mut self, shuffle: ShuffleMode) {
        self.shuffle = shuffle;
    }

    /// Change repeat mode; the order itself does not depend on it
    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    /// Draw a new order on the next rebuild, starting with `lead`
    pub fn reseed(&mut self, seed: u64, lead: Option<EntryHandle>) {
        self.seed = seed;
        self.lead = lead;
    }

    /// Recompute the play order
    ///
    /// Only valid entries for which `include` returns true take part.
    pub fn rebuild(&mut self, store: &EntryStore, include: &dyn Fn(&Entry) -> bool) {
        let items: Vec<Item> = store
            .handles()
            .iter()
            .enumerate()
            .filter_map(|(row, &handle)| {
                let entry = store.get(handle)?;
                (entry.is_valid() && include(entry)).then(|| Item {
                    row,
                    handle,
                    group: group_of(entry, handle),
                })
            })
            .collect();

        self.items = self.arrange(items);
        self.virtual_of_row = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.row, index))
            .collect();
    }

    fn arrange(&self, mut items: Vec<Item>) -> Vec<Item> {
        match self.shuffle {
            ShuffleMode::Off => return items,
            ShuffleMode::All => {
                items.sort_by_key(|item| (self.key(item.handle.to_bits()), item.row));
                if let Some(pos) = self.lead_position(&items) {
                    let lead = items.remove(pos);
                    items.insert(0, lead);
                }
                return items;
            }
            ShuffleMode::InsideAlbum | ShuffleMode::Albums | ShuffleMode::AlbumsAndTracks => {}
        }

        // Groups in order of first appearance
        let mut groups: Vec<(u64, Vec<Item>)> = Vec::new();
        let mut group_index: HashMap<u64, usize> = HashMap::new();
        for item in items {
            let index = *group_index.entry(item.group).or_insert_with(|| {
                groups.push((item.group, Vec::new()));
                groups.len() - 1
            });
            groups[index].1.push(item);
        }

        let shuffle_tracks = matches!(
            self.shuffle,
            ShuffleMode::InsideAlbum | ShuffleMode::AlbumsAndTracks
        );
        if shuffle_tracks {
            for (_, members) in &mut groups {
                members.sort_by_key(|item| (self.key(item.handle.to_bits()), item.row));
            }
        }

        if self.shuffle != ShuffleMode::InsideAlbum {
            // Stable sort keeps first-appearance order on key collisions
            groups.sort_by_key(|(group, _)| self.key(*group));
        }

        if let Some(lead) = self.lead {
            if let Some(index) = groups
                .iter()
                .position(|(_, members)| members.iter().any(|m| m.handle == lead))
            {
                let mut group = groups.remove(index);
                if shuffle_tracks {
                    if let Some(pos) = group.1.iter().position(|m| m.handle == lead) {
                        let item = group.1.remove(pos);
                        group.1.insert(0, item);
                    }
                }
                groups.insert(0, group);
            }
        }

        groups.into_iter().flat_map(|(_, members)| members).collect()
    }

    fn key(&self, salt: u64) -> u64 {
        StdRng::seed_from_u64(self.seed ^ salt).gen()
    }

    fn lead_position(&self, items: &[Item]) -> Option<usize> {
        let lead = self.lead?;
        items.iter().position(|item| item.handle == lead)
    }

    // ===== Queries =====

    /// Number of entries in the play order
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows in play order
    pub fn rows(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.row).collect()
    }

    /// Entries in play order
    pub fn handles(&self) -> Vec<EntryHandle> {
        self.items.iter().map(|item| item.handle).collect()
    }

    /// Row at virtual index `index`
    pub fn row_at(&self, index: usize) -> Option<usize> {
        self.items.get(index).map(|item| item.row)
    }

    /// Virtual index of `row`, `None` if the row does not take part
    pub fn virtual_index_of_row(&self, row: usize) -> Option<usize> {
        self.virtual_of_row.get(&row).copied()
    }

    /// Virtual index that follows `index`, `None` at the end
    pub fn next(&self, index: usize) -> Option<usize> {
        let len = self.items.len();
        if index >= len {
            return None;
        }

        match self.repeat {
            RepeatMode::Track => Some(index),
            RepeatMode::Album => {
                let group = self.items[index].group;
                (index + 1..len)
                    .find(|&i| self.items[i].group == group)
                    .or_else(|| (0..=index).find(|&i| self.items[i].group == group))
            }
            RepeatMode::Playlist => Some((index + 1) % len),
            RepeatMode::Off => (index + 1 < len).then_some(index + 1),
        }
    }

    /// Virtual index that precedes `index`, `None` at the start
    pub fn previous(&self, index: usize) -> Option<usize> {
        let len = self.items.len();
        if index >= len {
            return None;
        }

        match self.repeat {
            RepeatMode::Track => Some(index),
            RepeatMode::Album => {
                let group = self.items[index].group;
                (0..index)
                    .rev()
                    .find(|&i| self.items[i].group == group)
                    .or_else(|| (index..len).rev().find(|&i| self.items[i].group == group))
            }
            RepeatMode::Playlist => Some(if index == 0 { len - 1 } else { index - 1 }),
            RepeatMode::Off => index.checked_sub(1),
        }
    }

    /// Row that plays after `current`
    ///
    /// With no current row playback starts at the first virtual entry. A
    /// current row that is not part of the order (filtered out or greyed)
    /// continues with the next row after it when unshuffled, and from the
    /// start of the order otherwise.
    pub fn next_row(&self, current: Option<usize>) -> Option<usize> {
        let Some(current) = current else {
            return self.row_at(0);
        };

        if let Some(index) = self.virtual_index_of_row(current) {
            return self.next(index).and_then(|i| self.row_at(i));
        }

        let fallback = match self.shuffle {
            ShuffleMode::Off => self.items.iter().find(|item| item.row > current),
            _ => self.items.first(),
        };
        match (fallback, self.repeat) {
            (Some(item), _) => Some(item.row),
            (None, RepeatMode::Playlist) => self.row_at(0),
            (None, _) => None,
        }
    }

    /// Row that plays before `current`
    pub fn previous_row(&self, current: Option<usize>) -> Option<usize> {
        let current = current?;

        if let Some(index) = self.virtual_index_of_row(current) {
            return self.previous(index).and_then(|i| self.row_at(i));
        }

        match self.shuffle {
            ShuffleMode::Off => self
                .items
                .iter()
                .rev()
                .find(|item| item.row < current)
                .map(|item| item.row),
            _ => None,
        }
    }
}

impl Default for VirtualSequencer {
    fn default() -> Self {
        Self::new(ShuffleMode::Off, RepeatMode::Off, 0)
    }
}

/// Album group of an entry; entries without an album are groups of one
fn group_of(entry: &Entry, handle: EntryHandle) -> u64 {
    let mut hasher = DefaultHasher::new();
    match entry.metadata().album_key() {
        Some(key) => key.hash(&mut hasher),
        None => handle.to_bits().hash(&mut hasher),
    }
    hasher.finish()
}
