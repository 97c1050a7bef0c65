//! Category folders under the sorted root.
//!
//! A category folder is named `Category_<n>` or `Category_<n>_<description>`.
//! Nothing is cached: every call lists the sorted root again so routing always
//! reflects what is on disk, even if another process changed it in between.

use crate::error::{SortError, SortResult};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Prefix shared by every category folder name.
pub const CATEGORY_PREFIX: &str = "Category_";

/// The parsed form of a directory name under the sorted root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderName {
    /// `Category_<n>`, or `Category_<n>_` with an empty description
    NumericOnly(u32),
    /// `Category_<n>_<description>`
    NumericWithDescription(u32, String),
    /// Anything else, including numbers that overflow.
    Unrecognized,
}

impl FolderName {
    /// Parses a directory name.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediasort::category::FolderName;
    ///
    /// assert_eq!(FolderName::parse("Category_3"), FolderName::NumericOnly(3));
    /// assert_eq!(
    ///     FolderName::parse("Category_1_cats"),
    ///     FolderName::NumericWithDescription(1, "cats".to_string())
    /// );
    /// assert_eq!(FolderName::parse("Category_x"), FolderName::Unrecognized);
    /// ```
    pub fn parse(name: &str) -> Self {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^Category_([0-9]+)(?:_(.*))?$").expect("category pattern is valid")
        });

        let Some(captures) = pattern.captures(name) else {
            return Self::Unrecognized;
        };
        let Ok(id) = captures[1].parse::<u32>() else {
            return Self::Unrecognized;
        };
        match captures.get(2) {
            Some(description) if !description.as_str().is_empty() => {
                Self::NumericWithDescription(id, description.as_str().to_string())
            }
            _ => Self::NumericOnly(id),
        }
    }

    /// Returns the numeric id, if the name is a category folder at all.
    pub fn id(&self) -> Option<u32> {
        match self {
            Self::NumericOnly(id) | Self::NumericWithDescription(id, _) => Some(*id),
            Self::Unrecognized => None,
        }
    }

    /// Builds the folder name for an id and optional description.
    pub fn format(id: u32, description: Option<&str>) -> String {
        match description {
            Some(description) => format!("{}{}_{}", CATEGORY_PREFIX, id, description),
            None => format!("{}{}", CATEGORY_PREFIX, id),
        }
    }
}

/// A category folder found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFolder {
    pub id: u32,
    pub description: Option<String>,
    pub path: PathBuf,
}

impl CategoryFolder {
    /// The folder's name as it appears on disk.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| FolderName::format(self.id, self.description.as_deref()))
    }

    /// Counts the regular files currently inside the folder.
    pub fn file_count(&self) -> usize {
        fs::read_dir(&self.path)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Resolution precedence: described folders first, then by name.
    fn precedence_key(&self) -> (bool, String) {
        (self.description.is_none(), self.name())
    }
}

/// Reads and extends the set of category folders under a sorted root.
pub struct CategoryRegistry;

impl CategoryRegistry {
    /// Lists every category folder under `sorted_root`, ordered by id and then
    /// by resolution precedence.
    ///
    /// A missing sorted root is treated as having no categories. Entries that
    /// are not directories or whose names do not parse are skipped.
    pub fn list_categories(sorted_root: &Path) -> SortResult<Vec<CategoryFolder>> {
        if !sorted_root.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(sorted_root).map_err(|e| SortError::RegistryReadFailed {
            path: sorted_root.to_path_buf(),
            source: e,
        })?;

        let mut folders = Vec::new();
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let (id, description) = match FolderName::parse(name) {
                FolderName::NumericOnly(id) => (id, None),
                FolderName::NumericWithDescription(id, description) => (id, Some(description)),
                FolderName::Unrecognized => continue,
            };
            folders.push(CategoryFolder {
                id,
                description,
                path: entry.path(),
            });
        }

        folders.sort_by(|a, b| {
            a.id.cmp(&b.id)
                .then_with(|| a.precedence_key().cmp(&b.precedence_key()))
        });
        Ok(folders)
    }

    /// Finds the folder a category number routes to. Never creates anything.
    ///
    /// When several folders share the number, a described folder beats the
    /// bare `Category_<n>` form, and ties go to the lexicographically first name.
    pub fn resolve(sorted_root: &Path, number: u32) -> SortResult<CategoryFolder> {
        Self::list_categories(sorted_root)?
            .into_iter()
            .find(|folder| folder.id == number)
            .ok_or(SortError::CategoryNotFound { number })
    }

    /// Returns the smallest positive id not used by any entry under
    /// `sorted_root`.
    ///
    /// Plain files count too: a stray file named `Category_2` would block the
    /// creation of that folder, so its id is never handed out.
    pub fn allocate_next_id(sorted_root: &Path) -> SortResult<u32> {
        let used = Self::used_ids(sorted_root)?;

        let mut next = 1;
        while used.contains(&next) {
            next += 1;
        }
        Ok(next)
    }

    /// Allocates the next id and creates its folder, creating `sorted_root`
    /// first if needed.
    ///
    /// The description is trimmed; an empty or missing description yields a
    /// bare `Category_<n>` folder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediasort::category::CategoryRegistry;
    /// use std::path::Path;
    ///
    /// let folder = CategoryRegistry::create_category(Path::new("Sorted_Media"), Some("cats"))?;
    /// println!("Created {}", folder.path.display());
    /// # Ok::<(), mediasort::SortError>(())
    /// ```
    pub fn create_category(
        sorted_root: &Path,
        description: Option<&str>,
    ) -> SortResult<CategoryFolder> {
        let description = match description.map(str::trim) {
            Some(d) if !d.is_empty() => Some(validate_description(d)?),
            _ => None,
        };

        fs::create_dir_all(sorted_root).map_err(|e| SortError::DirectoryCreationFailed {
            path: sorted_root.to_path_buf(),
            source: e,
        })?;

        loop {
            let id = Self::allocate_next_id(sorted_root)?;
            let path = sorted_root.join(FolderName::format(id, description.as_deref()));
            match fs::create_dir(&path) {
                Ok(()) => {
                    return Ok(CategoryFolder {
                        id,
                        description,
                        path,
                    });
                }
                // Someone else took the id between listing and creating.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(SortError::DirectoryCreationFailed { path, source: e });
                }
            }
        }
    }

    fn used_ids(sorted_root: &Path) -> SortResult<BTreeSet<u32>> {
        if !sorted_root.is_dir() {
            return Ok(BTreeSet::new());
        }

        let entries = fs::read_dir(sorted_root).map_err(|e| SortError::RegistryReadFailed {
            path: sorted_root.to_path_buf(),
            source: e,
        })?;
        Ok(entries
            .flatten()
            .filter_map(|entry| FolderName::parse(entry.file_name().to_str()?).id())
            .collect())
    }
}

fn validate_description(description: &str) -> SortResult<String> {
    let invalid = |reason: &str| SortError::InvalidDescription {
        description: description.to_string(),
        reason: reason.to_string(),
    };

    if description.contains(['/', '\\']) {
        return Err(invalid("must not contain path separators"));
    }
    if description.contains('\0') {
        return Err(invalid("must not contain NUL characters"));
    }
    if description.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    Ok(description.to_string())
}
