/// Errors produced by the classification and undo engine.
///
/// "Nothing to do" outcomes (no current file, nothing to undo) are not errors;
/// operations report them as `Ok(None)`.
use crate::classifier::Action;
use std::path::PathBuf;

/// Errors that can occur while scanning, classifying or undoing.
#[derive(Debug)]
pub enum SortError {
    /// The source directory does not exist or is not a directory.
    InvalidSourceDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No category folder matches the requested number.
    CategoryNotFound { number: u32 },
    /// Copying a file into its category folder failed.
    CopyFailed {
        source_path: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The copy recorded by an action was already gone when undoing it.
    UndoTargetMissing { action: Action },
    /// Removing the copy recorded by an action failed.
    UndoFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create the sorted root or a category folder.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The sorted root exists but could not be listed.
    RegistryReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A category description cannot be used as part of a folder name.
    InvalidDescription { description: String, reason: String },
}

impl SortError {
    /// Returns true for failures the interactive layer should swallow silently.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::CategoryNotFound { .. })
    }
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourceDirectory { path, source } => {
                write!(f, "Invalid source directory {}: {}", path.display(), source)
            }
            Self::CategoryNotFound { number } => {
                write!(f, "No category folder for number {}", number)
            }
            Self::CopyFailed {
                source_path,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source_path.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::UndoTargetMissing { action } => {
                write!(
                    f,
                    "Nothing to remove at {}; the copy was already gone",
                    action.destination_path.display()
                )
            }
            Self::UndoFailed { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::RegistryReadFailed { path, source } => {
                write!(
                    f,
                    "Failed to read category folders in {}: {}",
                    path.display(),
                    source
                )
            }
            Self::InvalidDescription {
                description,
                reason,
            } => {
                write!(f, "Invalid category description '{}': {}", description, reason)
            }
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSourceDirectory { source, .. }
            | Self::UndoFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::RegistryReadFailed { source, .. } => Some(source),
            Self::CopyFailed { source_error, .. } => Some(source_error),
            _ => None,
        }
    }
}

/// Result type for engine operations.
pub type SortResult<T> = Result<T, SortError>;
