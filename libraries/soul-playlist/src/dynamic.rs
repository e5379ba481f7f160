//! Dynamic playlist refill
//!
//! While a [`Generator`] is attached the playlist keeps a window of upcoming
//! entries filled from it and trims played entries beyond a short history.
//! A generator that fails or runs dry is detached, which turns dynamic mode
//! off instead of retrying forever.

use crate::error::{PlaylistError, Result};
use crate::types::Entry;
use std::fmt;
use tracing::{debug, warn};

/// Source of entries for a dynamic playlist
pub trait Generator: Send {
    /// Name shown to the user
    fn name(&self) -> &str;

    /// Produce up to `count` new entries
    ///
    /// An empty batch means the generator is exhausted.
    fn next_batch(&mut self, count: usize) -> Result<Vec<Entry>>;

    /// Played entries to keep before the current one (default: from config)
    fn dynamic_history(&self) -> Option<usize> {
        None
    }

    /// Upcoming entries to keep after the current one (default: from config)
    fn dynamic_future(&self) -> Option<usize> {
        None
    }
}

/// What the playlist should do to keep the dynamic window in shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefillPlan {
    /// Entries to request from the generator and append
    pub request: usize,
    /// Played entries to drop from the top of the list
    pub trim: usize,
}

impl RefillPlan {
    pub fn is_empty(&self) -> bool {
        self.request == 0 && self.trim == 0
    }
}

/// Two-state controller: active while a generator is attached
pub struct DynamicRefillController {
    generator: Option<Box<dyn Generator>>,
    default_history: usize,
    default_future: usize,
}

impl DynamicRefillController {
    /// Inactive controller with fallback window sizes
    pub fn new(default_history: usize, default_future: usize) -> Self {
        Self {
            generator: None,
            default_history,
            default_future,
        }
    }

    pub fn is_active(&self) -> bool {
        self.generator.is_some()
    }

    /// Attach a generator, replacing any previous one
    pub fn attach(&mut self, generator: Box<dyn Generator>) {
        debug!(generator = generator.name(), "Dynamic mode on");
        self.generator = Some(generator);
    }

    /// Detach the generator, if any
    pub fn detach(&mut self) -> Option<Box<dyn Generator>> {
        self.generator.take()
    }

    /// Name of the attached generator
    pub fn generator_name(&self) -> Option<&str> {
        self.generator.as_deref().map(Generator::name)
    }

    /// Played entries kept before the current one
    pub fn history_len(&self) -> usize {
        self.generator
            .as_deref()
            .and_then(Generator::dynamic_history)
            .unwrap_or(self.default_history)
    }

    /// Upcoming entries kept after the current one
    pub fn future_len(&self) -> usize {
        self.generator
            .as_deref()
            .and_then(Generator::dynamic_future)
            .unwrap_or(self.default_future)
    }

    /// Work needed for a list of `len` rows with current row `current`
    ///
    /// Nothing is planned while inactive.
    pub fn plan(&self, len: usize, current: Option<usize>) -> RefillPlan {
        if !self.is_active() {
            return RefillPlan::default();
        }

        let upcoming = match current {
            Some(row) if row < len => len - row - 1,
            _ => len,
        };
        let trim = current
            .filter(|&row| row < len)
            .map_or(0, |row| row.saturating_sub(self.history_len()));

        RefillPlan {
            request: self.future_len().saturating_sub(upcoming),
            trim,
        }
    }

    /// Ask the generator for `count` entries
    ///
    /// A failing or exhausted generator is detached and an error returned.
    pub fn generate(&mut self, count: usize) -> Result<Vec<Entry>> {
        let Some(generator) = self.generator.as_mut() else {
            return Err(PlaylistError::InvalidOperation(
                "dynamic mode is not active".to_string(),
            ));
        };

        let outcome = match generator.next_batch(count) {
            Ok(batch) if batch.is_empty() => Err(PlaylistError::generator(format!(
                "{} has no more tracks",
                generator.name()
            ))),
            other => other,
        };

        if let Err(e) = &outcome {
            warn!(error = %e, "Generator stopped, leaving dynamic mode");
            self.generator = None;
        }
        outcome
    }
}

impl fmt::Debug for DynamicRefillController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRefillController")
            .field("generator", &self.generator_name())
            .field("default_history", &self.default_history)
            .field("default_future", &self.default_future)
            .finish()
    }
}
