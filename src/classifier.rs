/// Routing a media file into a category folder.
///
/// Classification copies the file into the folder a category number resolves
/// to and returns an [`Action`] describing the copy, so it can be undone later.
/// The source file is never moved, modified or deleted.
use crate::category::CategoryRegistry;
use crate::error::{SortError, SortResult};
use crate::scanner::MediaEntry;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What to do when the category folder already holds a file with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Pick a free name such as `photo (1).jpg`.
    #[default]
    Rename,
    /// Replace the existing file.
    Overwrite,
}

/// The kind of reversible operation an action records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Copy,
}

/// One reversible classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    /// Id of the category the file was routed to.
    pub category_id: u32,
    pub performed_at: DateTime<Local>,
}

impl Action {
    /// Base name of the source file.
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Copies media files into category folders.
pub struct Classifier;

impl Classifier {
    /// Copies `entry` into the folder for `category_number`.
    ///
    /// The number is resolved against the folders currently on disk; no folder
    /// is ever created here. The copy is written to a temporary file inside the
    /// category folder first and then moved into place, so a failed copy
    /// leaves nothing behind.
    ///
    /// # Errors
    ///
    /// * `SortError::CategoryNotFound` if no folder matches the number
    /// * `SortError::CopyFailed` if reading the source or writing the copy fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediasort::classifier::{Classifier, CollisionPolicy};
    /// use mediasort::media_kind::MediaKind;
    /// use mediasort::scanner::MediaEntry;
    /// use std::path::{Path, PathBuf};
    ///
    /// let entry = MediaEntry {
    ///     kind: MediaKind::Image,
    ///     path: PathBuf::from("/home/me/Camera/a.jpg"),
    /// };
    /// let action = Classifier::classify(&entry, 1, Path::new("Sorted_Media"), CollisionPolicy::Rename)?;
    /// println!("Copied to {}", action.destination_path.display());
    /// # Ok::<(), mediasort::SortError>(())
    /// ```
    pub fn classify(
        entry: &MediaEntry,
        category_number: u32,
        sorted_root: &Path,
        policy: CollisionPolicy,
    ) -> SortResult<Action> {
        let folder = CategoryRegistry::resolve(sorted_root, category_number)?;

        let file_name = entry
            .path
            .file_name()
            .ok_or_else(|| SortError::CopyFailed {
                source_path: entry.path.clone(),
                destination: folder.path.clone(),
                source_error: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        let mut destination = folder.path.join(file_name);
        if policy == CollisionPolicy::Rename && destination.exists() {
            destination = free_destination(&destination);
        }

        copy_into_place(&entry.path, &destination, policy).map_err(|e| SortError::CopyFailed {
            source_path: entry.path.clone(),
            destination: destination.clone(),
            source_error: e,
        })?;

        Ok(Action {
            kind: ActionKind::Copy,
            source_path: entry.path.clone(),
            destination_path: destination,
            category_id: folder.id,
            performed_at: Local::now(),
        })
    }
}

fn copy_into_place(source: &Path, destination: &Path, policy: CollisionPolicy) -> io::Result<()> {
    let parent = destination
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;

    let mut reader = File::open(source)?;
    let permissions = reader.metadata()?.permissions();

    let mut staged = NamedTempFile::new_in(parent)?;
    io::copy(&mut reader, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    fs::set_permissions(staged.path(), permissions)?;

    let persisted = match policy {
        CollisionPolicy::Overwrite => staged.persist(destination),
        CollisionPolicy::Rename => staged.persist_noclobber(destination),
    };
    persisted.map_err(|e| e.error)?;
    Ok(())
}

/// Finds the first `name (k).ext` next to `taken` that does not exist yet.
fn free_destination(taken: &Path) -> PathBuf {
    let stem = taken
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = taken
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = taken.parent().unwrap_or_else(|| Path::new(""));

    (1..)
        .map(|k| parent.join(format!("{} ({}){}", stem, k, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| taken.to_path_buf())
}
