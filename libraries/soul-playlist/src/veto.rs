//! Pre-insertion veto pipeline
//!
//! Listeners get to look at every batch of candidate entries before it enters
//! the playlist and name the ones they reject. A candidate rejected by any
//! listener is dropped.
//!
//! The pipeline holds listeners weakly. A listener dropped by its owner, or
//! unregistered from another thread while a pass is running, is simply not
//! called; a pass works on a snapshot of the registry taken when it starts.

use crate::types::Entry;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::debug;

/// Collaborator allowed to reject candidate entries
pub trait VetoListener: Send + Sync {
    /// Indices into `candidates` that must not be inserted
    ///
    /// `existing` is the playlist content at the time of the call.
    /// Out-of-range indices are ignored.
    fn evaluate(&self, existing: &[&Entry], candidates: &[Entry]) -> Vec<usize>;
}

impl<F> VetoListener for F
where
    F: Fn(&[&Entry], &[Entry]) -> Vec<usize> + Send + Sync,
{
    fn evaluate(&self, existing: &[&Entry], candidates: &[Entry]) -> Vec<usize> {
        self(existing, candidates)
    }
}

/// Registration token returned by [`VetoPipeline::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, Weak<dyn VetoListener>)>,
}

/// Ordered set of veto listeners
///
/// Cloning shares the registry, so a clone can be handed to another thread to
/// register or unregister listeners.
#[derive(Clone, Default)]
pub struct VetoPipeline {
    registry: Arc<RwLock<Registry>>,
}

impl VetoPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener after the ones already registered
    ///
    /// Only a weak reference is kept; the caller owns the listener.
    pub fn register<L: VetoListener + 'static>(&self, listener: &Arc<L>) -> ListenerId {
        let weak = Arc::downgrade(listener);
        let weak: Weak<dyn VetoListener> = weak;
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        registry
            .listeners
            .retain(|(_, listener)| listener.strong_count() > 0);

        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((id, weak));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = registry.listeners.len();
        registry.listeners.retain(|(registered, _)| *registered != id);
        registry.listeners.len() != before
    }

    /// Number of registered listeners that are still alive
    pub fn len(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .filter(|(_, listener)| listener.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every candidate rejected by at least one listener
    ///
    /// Listeners run in registration order; survivors keep their order.
    pub fn filter(&self, existing: &[&Entry], candidates: Vec<Entry>) -> Vec<Entry> {
        if candidates.is_empty() {
            return candidates;
        }

        let snapshot: Vec<Weak<dyn VetoListener>> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|(_, listener)| Weak::clone(listener))
            .collect();

        let mut invalid = BTreeSet::new();
        for listener in snapshot.iter().filter_map(Weak::upgrade) {
            invalid.extend(
                listener
                    .evaluate(existing, &candidates)
                    .into_iter()
                    .filter(|&index| index < candidates.len()),
            );
        }

        if invalid.is_empty() {
            return candidates;
        }

        debug!(
            rejected = invalid.len(),
            offered = candidates.len(),
            "Veto listeners rejected candidates"
        );

        candidates
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !invalid.contains(index))
            .map(|(_, entry)| entry)
            .collect()
    }
}

impl fmt::Debug for VetoPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VetoPipeline")
            .field("listeners", &self.len())
            .finish()
    }
}
