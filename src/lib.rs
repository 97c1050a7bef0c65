//! mediasort - manual triage of media files into numbered category folders
//!
//! This library scans a folder for images, videos and audio, copies the file
//! under review into the category folder picked by a number key, and keeps a
//! bounded history so recent copies can be undone. Category folders live under
//! a sorted root and are named `Category_<n>` or `Category_<n>_<description>`;
//! the folder tree itself is the only persisted state.

pub mod category;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod error;
pub mod media_kind;
pub mod output;
pub mod scanner;
pub mod session;
pub mod undo;

pub use category::{CategoryFolder, CategoryRegistry, FolderName};
pub use classifier::{Action, ActionKind, Classifier, CollisionPolicy};
pub use config::{CompiledFilters, ConfigError, Settings};
pub use cursor::Cursor;
pub use error::{SortError, SortResult};
pub use media_kind::{KindMapper, MediaKind};
pub use scanner::{MediaEntry, scan};
pub use session::{Session, SessionOptions};
pub use undo::UndoLedger;

pub use cli::{Cli, run_cli};
