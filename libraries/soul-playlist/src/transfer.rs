//! Drag-and-drop payloads
//!
//! Rows dragged inside a playlist travel as their row indices and are moved;
//! entries coming from elsewhere travel as a "play now" batch and are
//! inserted. See `Playlist::accept_drop`.

use crate::types::Entry;
use serde::{Deserialize, Serialize};

/// What is being dropped onto a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransferPayload {
    /// Rows of the same playlist, ascending
    Rows(Vec<usize>),

    /// Entries from outside, to be inserted and played
    PlayNow(Vec<Entry>),
}

/// Payload for dragging `rows` within a playlist
pub fn encode_rows(rows: &[usize]) -> TransferPayload {
    let mut rows = rows.to_vec();
    rows.sort_unstable();
    rows.dedup();
    TransferPayload::Rows(rows)
}

/// Convert a drop target to a move destination
///
/// A drop lands *before* `row` as the user sees the list, i.e. with the
/// dragged rows still in place. Moves take their destination in the list
/// without those rows, so every source above the target shifts it up by one.
pub fn drop_destination(sources: &[usize], row: usize) -> usize {
    let above = sources.iter().filter(|&&source| source < row).count();
    row.saturating_sub(above)
}
