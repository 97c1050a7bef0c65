/// Position of the file currently under review.
///
/// The cursor owns the working set. It never rescans on its own: when
/// [`Cursor::advance`] runs off the end it reports [`Advance::EndReached`] and
/// the caller rebuilds the working set from a fresh scan.
use crate::scanner::MediaEntry;
use std::path::Path;

/// Outcome of moving the cursor forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor now points at the next entry.
    Moved,
    /// The cursor ran past the last entry and was reset to the start; the
    /// working set should be rebuilt.
    EndReached,
    /// The working set is empty.
    Empty,
}

/// Index into the working set.
///
/// Invariant: `index < working_set.len()` whenever the working set is not empty.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    index: usize,
    working_set: Vec<MediaEntry>,
}

impl Cursor {
    /// Creates a cursor at the start of `working_set`.
    pub fn new(working_set: Vec<MediaEntry>) -> Self {
        Self {
            index: 0,
            working_set,
        }
    }

    /// The entry under review, or `None` when nothing is left.
    pub fn current(&self) -> Option<&MediaEntry> {
        self.working_set.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.working_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working_set.is_empty()
    }

    pub fn entries(&self) -> &[MediaEntry] {
        &self.working_set
    }

    /// Moves to the next entry.
    pub fn advance(&mut self) -> Advance {
        if self.working_set.is_empty() {
            return Advance::Empty;
        }
        self.index += 1;
        if self.index >= self.working_set.len() {
            self.index = 0;
            return Advance::EndReached;
        }
        Advance::Moved
    }

    /// Moves back one entry, stopping at the first.
    pub fn retreat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Replaces the working set wholesale and starts over at the first entry.
    pub fn rebuild(&mut self, working_set: Vec<MediaEntry>) {
        self.working_set = working_set;
        self.index = 0;
    }

    /// Replaces the working set but stays at the same index, clamped to the
    /// new last entry.
    pub fn rebuild_in_place(&mut self, working_set: Vec<MediaEntry>) {
        self.index = self.index.min(working_set.len().saturating_sub(1));
        self.working_set = working_set;
    }

    /// Points the cursor at the entry with the given path, if present.
    pub fn seek(&mut self, path: &Path) -> bool {
        match self.working_set.iter().position(|entry| entry.path == path) {
            Some(position) => {
                self.index = position;
                true
            }
            None => false,
        }
    }
}
