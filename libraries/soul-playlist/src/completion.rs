//! Background completion queue
//!
//! Metadata resolution and rating persistence run off the owner thread. They
//! report back by posting a [`Completion`] tagged with the entry's handle; the
//! playlist drains the queue on its own thread and applies what still
//! matters. A completion for an entry that is gone is dropped.

use crate::handle::EntryHandle;
use crate::types::EntryMetadata;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Outcome of a piece of background work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompletionKind {
    /// URL resolved to full metadata
    MetadataResolved(EntryMetadata),

    /// URL could not be resolved
    ResolutionFailed {
        /// Why resolution failed
        reason: String,
    },

    /// Rating was stored
    RatingSaved {
        /// Stored rating
        rating: f32,
    },

    /// Rating could not be stored
    RatingFailed {
        /// Why the rating was not stored
        reason: String,
    },
}

/// Message posted by background work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Entry the work was for
    pub handle: EntryHandle,
    /// What happened
    pub kind: CompletionKind,
}

/// Sending half of the completion queue
///
/// Cheap to clone; `send` never blocks and can be called from any thread.
#[derive(Debug, Clone)]
pub struct CompletionSender {
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionSender {
    /// Post a completion; returns false if the playlist is gone
    pub fn send(&self, completion: Completion) -> bool {
        self.tx.send(completion).is_ok()
    }

    pub fn metadata_resolved(&self, handle: EntryHandle, metadata: EntryMetadata) -> bool {
        self.send(Completion {
            handle,
            kind: CompletionKind::MetadataResolved(metadata),
        })
    }

    pub fn resolution_failed(&self, handle: EntryHandle, reason: impl Into<String>) -> bool {
        self.send(Completion {
            handle,
            kind: CompletionKind::ResolutionFailed {
                reason: reason.into(),
            },
        })
    }

    pub fn rating_saved(&self, handle: EntryHandle, rating: f32) -> bool {
        self.send(Completion {
            handle,
            kind: CompletionKind::RatingSaved { rating },
        })
    }

    pub fn rating_failed(&self, handle: EntryHandle, reason: impl Into<String>) -> bool {
        self.send(Completion {
            handle,
            kind: CompletionKind::RatingFailed {
                reason: reason.into(),
            },
        })
    }
}

/// Receiving half, owned by the playlist
#[derive(Debug)]
pub(crate) struct CompletionQueue {
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> CompletionSender {
        CompletionSender {
            tx: self.tx.clone(),
        }
    }

    /// Everything posted so far, in posting order
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            completions.push(completion);
        }
        completions
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}
