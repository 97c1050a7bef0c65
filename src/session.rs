//! A sorting session over one source directory.
//!
//! [`Session`] carries everything the engine needs between keypresses: the
//! working set and cursor, the undo ledger, and the settings that shape
//! scanning and copying. Each operation runs to completion before returning,
//! and a failed classification leaves the session exactly as it was.
//!
//! # Examples
//!
//! ```no_run
//! use mediasort::session::{Session, SessionOptions};
//! use std::path::Path;
//!
//! let mut session = Session::open(
//!     Path::new("/home/me/Camera"),
//!     Path::new("/home/me/Sorted_Media"),
//!     SessionOptions::default(),
//! )?;
//! session.create_category(Some("cats"))?;
//! if let Some(action) = session.classify(1)? {
//!     println!("Copied to {}", action.destination_path.display());
//! }
//! session.undo_last()?;
//! # Ok::<(), mediasort::SortError>(())
//! ```

use crate::category::{CategoryFolder, CategoryRegistry};
use crate::classifier::{Action, Classifier, CollisionPolicy};
use crate::config::{CompiledFilters, ConfigError, DEFAULT_UNDO_CAPACITY, Settings};
use crate::cursor::{Advance, Cursor};
use crate::error::{SortError, SortResult};
use crate::media_kind::KindMapper;
use crate::scanner::{self, MediaEntry};
use crate::undo::UndoLedger;
use std::path::{Path, PathBuf};

/// How a session scans and copies.
#[derive(Debug)]
pub struct SessionOptions {
    pub mapper: KindMapper,
    pub filters: CompiledFilters,
    pub collision_policy: CollisionPolicy,
    pub undo_capacity: usize,
}

impl SessionOptions {
    /// Builds options from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            mapper: settings.kind_mapper(),
            filters: settings.filters.compile()?,
            collision_policy: settings.session.on_collision,
            undo_capacity: settings.session.undo_capacity,
        })
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mapper: KindMapper::default(),
            filters: CompiledFilters::default(),
            collision_policy: CollisionPolicy::default(),
            undo_capacity: DEFAULT_UNDO_CAPACITY,
        }
    }
}

/// State of one running triage.
#[derive(Debug)]
pub struct Session {
    source_dir: PathBuf,
    sorted_root: PathBuf,
    options: SessionOptions,
    cursor: Cursor,
    ledger: UndoLedger,
}

impl Session {
    /// Opens `source_dir` and scans it for files to sort.
    ///
    /// # Errors
    ///
    /// Returns `SortError::InvalidSourceDirectory` if the directory cannot be
    /// scanned.
    pub fn open(source_dir: &Path, sorted_root: &Path, options: SessionOptions) -> SortResult<Self> {
        let entries = scanner::scan(source_dir, sorted_root, &options.mapper, &options.filters)?;
        Ok(Self {
            source_dir: source_dir.to_path_buf(),
            sorted_root: sorted_root.to_path_buf(),
            ledger: UndoLedger::new(options.undo_capacity),
            options,
            cursor: Cursor::new(entries),
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn sorted_root(&self) -> &Path {
        &self.sorted_root
    }

    /// The files currently eligible for sorting.
    pub fn working_set(&self) -> &[MediaEntry] {
        self.cursor.entries()
    }

    /// Zero-based position of the current entry and the working set size.
    pub fn position(&self) -> (usize, usize) {
        (self.cursor.index(), self.cursor.len())
    }

    /// The file under review, or `None` when nothing is left to sort.
    pub fn current_entry(&self) -> Option<&MediaEntry> {
        self.cursor.current()
    }

    /// Rebuilds the working set from disk and starts at its first entry.
    pub fn rescan(&mut self) -> SortResult<()> {
        let entries = self.scan()?;
        self.cursor.rebuild(entries);
        Ok(())
    }

    /// Copies the current file into category `category_number`.
    ///
    /// Returns `Ok(None)` when there is no current file. On success the action
    /// is recorded for undo and the cursor moves on; running off the end of
    /// the working set triggers a rescan.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` and `CopyFailed` leave the session untouched. If the
    /// copy succeeded but the follow-up rescan fails, the action stays recorded
    /// and the rescan error is returned.
    pub fn classify(&mut self, category_number: u32) -> SortResult<Option<Action>> {
        let Some(entry) = self.cursor.current() else {
            return Ok(None);
        };
        let action = Classifier::classify(
            entry,
            category_number,
            &self.sorted_root,
            self.options.collision_policy,
        )?;
        self.ledger.push(action.clone());

        if self.cursor.advance() == Advance::EndReached {
            self.rescan()?;
        }
        Ok(Some(action))
    }

    /// Reverses the most recent classification.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. Afterwards the working
    /// set is rescanned and the cursor points at the restored file; if that
    /// file is not eligible any more, the cursor steps back one entry instead.
    /// A failed rescan keeps the previous working set, since the copy is
    /// already gone by then.
    ///
    /// # Errors
    ///
    /// `UndoTargetMissing` is returned after the ledger entry was consumed and
    /// the cursor repositioned, so callers can treat it as a warning.
    pub fn undo_last(&mut self) -> SortResult<Option<Action>> {
        match self.ledger.pop_and_reverse() {
            Ok(None) => Ok(None),
            Ok(Some(action)) => {
                self.return_to(&action.source_path);
                Ok(Some(action))
            }
            Err(SortError::UndoTargetMissing { action }) => {
                self.return_to(&action.source_path);
                Err(SortError::UndoTargetMissing { action })
            }
            Err(e) => Err(e),
        }
    }

    /// Creates the next category folder.
    pub fn create_category(&self, description: Option<&str>) -> SortResult<CategoryFolder> {
        CategoryRegistry::create_category(&self.sorted_root, description)
    }

    /// Lists the category folders currently on disk.
    pub fn categories(&self) -> SortResult<Vec<CategoryFolder>> {
        CategoryRegistry::list_categories(&self.sorted_root)
    }

    /// Undoable actions, newest first.
    pub fn history(&self) -> impl Iterator<Item = &Action> {
        self.ledger.iter_newest_first()
    }

    fn scan(&self) -> SortResult<Vec<MediaEntry>> {
        scanner::scan(
            &self.source_dir,
            &self.sorted_root,
            &self.options.mapper,
            &self.options.filters,
        )
    }

    fn return_to(&mut self, source_path: &Path) {
        if let Ok(entries) = self.scan() {
            self.cursor.rebuild_in_place(entries);
        }
        if !self.cursor.seek(source_path) {
            self.cursor.retreat();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Setup {
        _temp_dir: TempDir,
        source: PathBuf,
        sorted: PathBuf,
    }

    fn setup(files: &[&str]) -> Setup {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("inbox");
        let sorted = temp_dir.path().join("Sorted_Media");
        fs::create_dir(&source).unwrap();
        for name in files {
            fs::write(source.join(name), name).unwrap();
        }
        Setup {
            _temp_dir: temp_dir,
            source,
            sorted,
        }
    }

    fn current_name(session: &Session) -> Option<String> {
        session.current_entry().map(MediaEntry::file_name)
    }

    #[test]
    fn test_open_invalid_source() {
        let s = setup(&[]);
        let result = Session::open(&s.source.join("nope"), &s.sorted, SessionOptions::default());
        assert!(matches!(result, Err(SortError::InvalidSourceDirectory { .. })));
    }

    #[test]
    fn test_empty_session_is_noop() {
        let s = setup(&[]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();
        session.create_category(None).unwrap();

        assert!(session.current_entry().is_none());
        assert!(session.classify(1).unwrap().is_none());
        assert!(session.undo_last().unwrap().is_none());
    }

    #[test]
    fn test_classify_unknown_category_keeps_state() {
        let s = setup(&["a.jpg", "b.jpg"]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();

        let result = session.classify(3);
        assert!(matches!(result, Err(SortError::CategoryNotFound { number: 3 })));
        assert_eq!(current_name(&session).as_deref(), Some("a.jpg"));
        assert_eq!(session.history().count(), 0);
    }

    #[test]
    fn test_failed_copy_keeps_state() {
        let s = setup(&["a.jpg", "b.jpg"]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();
        let folder = session.create_category(Some("cats")).unwrap();
        fs::remove_file(s.source.join("a.jpg")).unwrap();

        let result = session.classify(1);
        assert!(matches!(result, Err(SortError::CopyFailed { .. })));
        assert_eq!(session.history().count(), 0);
        assert_eq!(current_name(&session).as_deref(), Some("a.jpg"));
        assert_eq!(session.position(), (0, 2));
        assert_eq!(fs::read_dir(&folder.path).unwrap().count(), 0);
    }

    #[test]
    fn test_classify_advances_and_records() {
        let s = setup(&["a.jpg", "b.jpg"]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();
        session.create_category(Some("cats")).unwrap();

        let action = session.classify(1).unwrap().expect("expected an action");
        assert_eq!(action.file_name(), "a.jpg");
        assert_eq!(current_name(&session).as_deref(), Some("b.jpg"));
        assert_eq!(session.history().count(), 1);
    }

    #[test]
    fn test_running_off_the_end_rescans() {
        let s = setup(&["a.jpg", "b.jpg"]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();
        session.create_category(None).unwrap();

        session.classify(1).unwrap();
        session.classify(1).unwrap();
        assert!(session.working_set().is_empty());
        assert!(session.current_entry().is_none());
    }

    #[test]
    fn test_undo_returns_to_restored_file() {
        let s = setup(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();
        session.create_category(None).unwrap();

        session.classify(1).unwrap();
        session.classify(1).unwrap();
        session.classify(1).unwrap();
        assert!(session.working_set().is_empty());

        let undone = session.undo_last().unwrap().expect("expected an action");
        assert_eq!(undone.file_name(), "c.jpg");
        assert_eq!(current_name(&session).as_deref(), Some("c.jpg"));
        assert_eq!(session.working_set().len(), 1);

        session.undo_last().unwrap();
        assert_eq!(current_name(&session).as_deref(), Some("b.jpg"));
        assert_eq!(session.position(), (0, 2));
    }

    #[test]
    fn test_undo_target_missing_still_consumes() {
        let s = setup(&["a.jpg", "b.jpg"]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();
        session.create_category(None).unwrap();

        let action = session.classify(1).unwrap().unwrap();
        fs::remove_file(&action.destination_path).unwrap();

        let result = session.undo_last();
        assert!(matches!(result, Err(SortError::UndoTargetMissing { .. })));
        assert_eq!(session.history().count(), 0);
        assert_eq!(current_name(&session).as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_undo_succeeds_when_rescan_fails() {
        let s = setup(&["a.jpg", "b.jpg"]);
        let mut session = Session::open(&s.source, &s.sorted, SessionOptions::default()).unwrap();
        session.create_category(None).unwrap();

        let action = session.classify(1).unwrap().unwrap();
        fs::remove_dir_all(&s.source).unwrap();

        let undone = session.undo_last().unwrap().expect("expected an action");
        assert_eq!(undone.file_name(), "a.jpg");
        assert!(!action.destination_path.exists());
        assert_eq!(session.history().count(), 0);
        assert_eq!(current_name(&session).as_deref(), Some("a.jpg"));
        assert_eq!(session.position(), (0, 2));
    }

    #[test]
    fn test_ledger_capacity_from_options() {
        let s = setup(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
        let options = SessionOptions {
            undo_capacity: 2,
            ..SessionOptions::default()
        };
        let mut session = Session::open(&s.source, &s.sorted, options).unwrap();
        session.create_category(None).unwrap();

        for _ in 0..4 {
            session.classify(1).unwrap();
        }
        assert_eq!(session.history().count(), 2);
    }
}
