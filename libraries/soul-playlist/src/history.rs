//! Undo history
//!
//! Linear undo/redo over [`Command`]s. Recording a new edit after an undo
//! throws away everything that could have been redone.

use crate::commands::{Command, Editable};
use crate::handle::EntryHandle;

/// Bounded linear undo history
///
/// `commands[..cursor]` are applied, `commands[cursor..]` are undone.
#[derive(Debug, Clone)]
pub struct MutationLog {
    commands: Vec<Command>,
    cursor: usize,

    /// Maximum number of commands kept, 0 = unlimited
    limit: usize,
}

impl MutationLog {
    /// Create an empty history keeping at most `limit` commands (0 = unlimited)
    pub fn new(limit: usize) -> Self {
        Self {
            commands: Vec::new(),
            cursor: 0,
            limit,
        }
    }

    /// Run `command` and record it
    ///
    /// Returns entries that no remaining command can bring back; the caller
    /// releases them.
    pub(crate) fn push(
        &mut self,
        mut command: Command,
        target: &mut impl Editable,
    ) -> Vec<EntryHandle> {
        command.redo(target);

        let mut orphans: Vec<EntryHandle> = self
            .commands
            .drain(self.cursor..)
            .flat_map(|undone| undone.orphans(false))
            .collect();

        self.commands.push(command);
        self.cursor = self.commands.len();

        if self.limit > 0 && self.commands.len() > self.limit {
            let excess = self.commands.len() - self.limit;
            orphans.extend(
                self.commands
                    .drain(..excess)
                    .flat_map(|done| done.orphans(true)),
            );
            self.cursor -= excess;
        }

        orphans
    }

    /// Revert the last applied command; no-op with nothing to undo
    pub(crate) fn undo(&mut self, target: &mut impl Editable) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.commands[self.cursor].undo(target);
        true
    }

    /// Re-apply the last undone command; no-op with nothing to redo
    pub(crate) fn redo(&mut self, target: &mut impl Editable) -> bool {
        let Some(command) = self.commands.get_mut(self.cursor) else {
            return false;
        };
        command.redo(target);
        self.cursor += 1;
        true
    }

    /// Forget every command; returns entries to release
    pub(crate) fn clear(&mut self) -> Vec<EntryHandle> {
        let cursor = self.cursor;
        self.cursor = 0;
        self.commands
            .drain(..)
            .enumerate()
            .flat_map(|(index, command)| command.orphans(index < cursor))
            .collect()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Description of what undo would revert
    pub fn undo_text(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(Command::description)
    }

    /// Description of what redo would re-apply
    pub fn redo_text(&self) -> Option<String> {
        self.commands.get(self.cursor).map(Command::description)
    }

    /// Number of recorded commands (applied and undone)
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for MutationLog {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Bare;
    use crate::types::Entry;

    #[test]
    fn undo_redo_cursor() {
        let mut bare = Bare::with(&["A", "B", "C"]);
        let mut log = MutationLog::new(0);

        let cmd = Command::remove(&bare.store, &[0]);
        assert!(log.push(cmd, &mut bare).is_empty());
        assert_eq!(bare.titles(), vec!["B", "C"]);
        assert_eq!(log.undo_text().as_deref(), Some("Remove 1 song"));
        assert!(!log.can_redo());

        assert!(log.undo(&mut bare));
        assert_eq!(bare.titles(), vec!["A", "B", "C"]);
        assert!(!log.undo(&mut bare));
        assert_eq!(log.redo_text().as_deref(), Some("Remove 1 song"));

        assert!(log.redo(&mut bare));
        assert!(!log.redo(&mut bare));
        assert_eq!(bare.titles(), vec!["B", "C"]);
    }

    #[test]
    fn new_edit_truncates_redo_branch() {
        let mut bare = Bare::with(&["A", "B"]);
        let mut log = MutationLog::new(0);

        let x = bare.store.allocate(Entry::url("x"));
        log.push(Command::insert(vec![x], 0), &mut bare);
        log.undo(&mut bare);
        assert!(log.can_redo());

        let orphans = log.push(Command::move_rows(&bare.store, &[0], 1), &mut bare);
        assert_eq!(orphans, vec![x]);
        assert!(!log.can_redo());
        assert_eq!(log.len(), 1);
        assert_eq!(bare.titles(), vec!["B", "A"]);
    }

    #[test]
    fn limit_drops_oldest() {
        let mut bare = Bare::with(&["A", "B", "C", "D"]);
        let mut log = MutationLog::new(2);

        let removed_a = bare.store.handle_at(0).unwrap();
        log.push(Command::remove(&bare.store, &[0]), &mut bare);
        log.push(Command::move_rows(&bare.store, &[0], 1), &mut bare);
        let orphans = log.push(Command::move_rows(&bare.store, &[0], 1), &mut bare);

        assert_eq!(orphans, vec![removed_a]);
        assert_eq!(log.len(), 2);
        assert!(log.undo(&mut bare));
        assert!(log.undo(&mut bare));
        assert!(!log.undo(&mut bare));
        assert_eq!(bare.titles(), vec!["B", "C", "D"]);
    }

    #[test]
    fn clear_reports_orphans() {
        let mut bare = Bare::with(&["A", "B"]);
        let mut log = MutationLog::new(0);
        let a = bare.store.handle_at(0).unwrap();

        log.push(Command::remove(&bare.store, &[0]), &mut bare);
        assert_eq!(log.clear(), vec![a]);
        assert!(log.is_empty());
        assert!(!log.can_undo());
    }
}
