/// Bounded history of classifications that can be undone.
///
/// The ledger is a plain recency queue: new actions go to the back, and once it
/// holds more than its capacity the oldest action is dropped for good.
/// Undoing pops the newest action and deletes the copy it made.
use crate::classifier::{Action, ActionKind};
use crate::config::DEFAULT_UNDO_CAPACITY;
use crate::error::{SortError, SortResult};
use std::collections::VecDeque;
use std::fs;
use std::io;

/// Undo history for one session. Nothing is persisted.
#[derive(Debug)]
pub struct UndoLedger {
    actions: VecDeque<Action>,
    capacity: usize,
}

impl UndoLedger {
    /// Creates an empty ledger holding at most `capacity` actions.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            actions: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Records an action, evicting the oldest one if the ledger is full.
    pub fn push(&mut self, action: Action) {
        self.actions.push_back(action);
        while self.actions.len() > self.capacity {
            self.actions.pop_front();
        }
    }

    /// Iterates over the recorded actions, newest first.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().rev()
    }

    /// Reverses the most recent action.
    ///
    /// Returns `Ok(None)` when there is nothing to undo, and the reversed
    /// action otherwise.
    ///
    /// # Errors
    ///
    /// * `SortError::UndoTargetMissing` if the copy was already gone. The
    ///   action is still consumed.
    /// * `SortError::UndoFailed` if the copy could not be removed. The action
    ///   stays on the ledger so the undo can be retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediasort::undo::UndoLedger;
    ///
    /// let mut ledger = UndoLedger::new(20);
    /// assert!(ledger.pop_and_reverse().unwrap().is_none());
    /// ```
    pub fn pop_and_reverse(&mut self) -> SortResult<Option<Action>> {
        let Some(action) = self.actions.pop_back() else {
            return Ok(None);
        };

        match action.kind {
            ActionKind::Copy => match fs::remove_file(&action.destination_path) {
                Ok(()) => Ok(Some(action)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Err(SortError::UndoTargetMissing { action })
                }
                Err(e) => {
                    let path = action.destination_path.clone();
                    self.actions.push_back(action);
                    Err(SortError::UndoFailed { path, source: e })
                }
            },
        }
    }
}

impl Default for UndoLedger {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn copy_action(dir: &Path, name: &str) -> Action {
        let destination = dir.join(name);
        fs::write(&destination, name).expect("Failed to write copy");
        Action {
            kind: ActionKind::Copy,
            source_path: PathBuf::from("/media/src").join(name),
            destination_path: destination,
            category_id: 1,
            performed_at: Local::now(),
        }
    }

    #[test]
    fn test_empty_ledger_is_noop() {
        let mut ledger = UndoLedger::default();
        assert_eq!(ledger.capacity(), 20);
        assert!(ledger.pop_and_reverse().unwrap().is_none());
    }

    #[test]
    fn test_undo_removes_copy() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::default();
        let action = copy_action(temp_dir.path(), "a.jpg");
        ledger.push(action.clone());

        let undone = ledger.pop_and_reverse().unwrap().expect("expected an action");
        assert_eq!(undone, action);
        assert!(!action.destination_path.exists());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_undo_is_lifo() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::default();
        ledger.push(copy_action(temp_dir.path(), "first.jpg"));
        ledger.push(copy_action(temp_dir.path(), "second.jpg"));

        let undone = ledger.pop_and_reverse().unwrap().unwrap();
        assert_eq!(undone.file_name(), "second.jpg");
        assert!(temp_dir.path().join("first.jpg").exists());
    }

    #[test]
    fn test_bounded_ledger_evicts_oldest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::new(20);
        for i in 0..25 {
            ledger.push(copy_action(temp_dir.path(), &format!("{i:02}.jpg")));
        }
        assert_eq!(ledger.len(), 20);

        let mut undone = Vec::new();
        while let Some(action) = ledger.pop_and_reverse().unwrap() {
            undone.push(action.file_name());
        }
        assert_eq!(undone.len(), 20);
        assert_eq!(undone.first().map(String::as_str), Some("24.jpg"));
        assert_eq!(undone.last().map(String::as_str), Some("05.jpg"));
        for i in 0..5 {
            assert!(temp_dir.path().join(format!("{i:02}.jpg")).exists());
        }
    }

    #[test]
    fn test_missing_target_consumes_entry() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::default();
        let action = copy_action(temp_dir.path(), "a.jpg");
        fs::remove_file(&action.destination_path).unwrap();
        ledger.push(action);

        let result = ledger.pop_and_reverse();
        assert!(matches!(result, Err(SortError::UndoTargetMissing { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_failed_removal_keeps_entry() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::default();
        // A directory at the destination cannot be removed with remove_file.
        let destination = temp_dir.path().join("a.jpg");
        fs::create_dir(&destination).unwrap();
        ledger.push(Action {
            kind: ActionKind::Copy,
            source_path: PathBuf::from("/media/src/a.jpg"),
            destination_path: destination,
            category_id: 1,
            performed_at: Local::now(),
        });

        let result = ledger.pop_and_reverse();
        assert!(matches!(result, Err(SortError::UndoFailed { .. })));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_history_is_newest_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::new(2);
        ledger.push(copy_action(temp_dir.path(), "a.jpg"));
        ledger.push(copy_action(temp_dir.path(), "b.jpg"));
        ledger.push(copy_action(temp_dir.path(), "c.jpg"));

        let names: Vec<String> = ledger.iter_newest_first().map(Action::file_name).collect();
        assert_eq!(names, vec!["c.jpg", "b.jpg"]);
    }
}
