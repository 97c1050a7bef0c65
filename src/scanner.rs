/// Discovery of the files still waiting to be sorted.
///
/// The scanner lists the immediate children of a source directory, keeps the
/// regular files that pass the filters and have a media extension, and drops
/// every file whose name already appears in some category folder.
use crate::category::CategoryRegistry;
use crate::config::CompiledFilters;
use crate::error::{SortError, SortResult};
use crate::media_kind::{KindMapper, MediaKind};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// A media file eligible for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    pub kind: MediaKind,
    pub path: PathBuf,
}

impl MediaEntry {
    /// The file's base name, used for the copy's name and for exclusion.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Scans `source_dir` for files that still need sorting.
///
/// The result is sorted by file name, so the "current" file after a rescan
/// does not depend on the platform's directory order. A missing
/// `sorted_root` simply means nothing has been sorted yet.
///
/// # Errors
///
/// Returns `SortError::InvalidSourceDirectory` if `source_dir` does not exist,
/// is not a directory or cannot be listed.
///
/// # Examples
///
/// ```no_run
/// use mediasort::config::Settings;
/// use mediasort::media_kind::KindMapper;
/// use mediasort::scanner::scan;
/// use std::path::Path;
///
/// let filters = Settings::default().filters.compile().unwrap();
/// let entries = scan(
///     Path::new("/home/me/Camera"),
///     Path::new("Sorted_Media"),
///     &KindMapper::default(),
///     &filters,
/// )?;
/// for entry in &entries {
///     println!("{} {}", entry.kind, entry.path.display());
/// }
/// # Ok::<(), mediasort::SortError>(())
/// ```
pub fn scan(
    source_dir: &Path,
    sorted_root: &Path,
    mapper: &KindMapper,
    filters: &CompiledFilters,
) -> SortResult<Vec<MediaEntry>> {
    let invalid = |source: std::io::Error| SortError::InvalidSourceDirectory {
        path: source_dir.to_path_buf(),
        source,
    };

    if !source_dir.is_dir() {
        return Err(invalid(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "not an existing directory",
        )));
    }
    let source_dir = std::path::absolute(source_dir).map_err(invalid)?;
    let entries = fs::read_dir(&source_dir).map_err(invalid)?;

    let sorted_names = sorted_file_names(sorted_root)?;

    let mut found: Vec<(OsString, MediaEntry)> = Vec::new();
    for entry in entries.flatten() {
        if let Ok(file_type) = entry.file_type()
            && file_type.is_file()
        {
            let name = entry.file_name();
            if sorted_names.contains(&name) || !filters.should_include(Path::new(&name)) {
                continue;
            }
            let path = entry.path();
            if let Some(kind) = mapper.kind_of(&path) {
                found.push((name, MediaEntry { kind, path }));
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, entry)| entry).collect())
}

/// Collects the names of all files inside every category folder.
fn sorted_file_names(sorted_root: &Path) -> SortResult<HashSet<OsString>> {
    let mut names = HashSet::new();
    for folder in CategoryRegistry::list_categories(sorted_root)? {
        // A folder that vanished since listing contributes nothing.
        let Ok(entries) = fs::read_dir(&folder.path) else {
            continue;
        };
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                names.insert(entry.file_name());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use tempfile::TempDir;

    fn run_scan(source: &Path, sorted_root: &Path) -> SortResult<Vec<MediaEntry>> {
        let filters = Settings::default().filters.compile().unwrap();
        scan(source, sorted_root, &KindMapper::default(), &filters)
    }

    fn names(entries: &[MediaEntry]) -> Vec<String> {
        entries.iter().map(MediaEntry::file_name).collect()
    }

    #[test]
    fn test_scan_tags_kinds_and_sorts_by_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path();
        for name in ["c.mp3", "a.jpg", "b.mp4", "notes.txt"] {
            fs::write(source.join(name), name).unwrap();
        }

        let entries = run_scan(source, &source.join("Sorted_Media")).unwrap();
        assert_eq!(names(&entries), vec!["a.jpg", "b.mp4", "c.mp3"]);
        assert_eq!(entries[0].kind, MediaKind::Image);
        assert_eq!(entries[1].kind, MediaKind::Video);
        assert_eq!(entries[2].kind, MediaKind::Audio);
        assert!(entries.iter().all(|e| e.path.is_absolute()));
    }

    #[test]
    fn test_scan_does_not_recurse() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path();
        fs::create_dir(source.join("nested")).unwrap();
        fs::write(source.join("nested").join("deep.png"), "x").unwrap();
        fs::create_dir(source.join("folder.jpg")).unwrap();

        let entries = run_scan(source, &source.join("Sorted_Media")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_scan_excludes_already_sorted_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        let sorted = temp_dir.path().join("Sorted_Media");
        fs::create_dir(&source).unwrap();
        fs::create_dir_all(sorted.join("Category_2_dogs")).unwrap();
        fs::create_dir_all(sorted.join("Unrelated")).unwrap();
        fs::write(source.join("a.jpg"), "a").unwrap();
        fs::write(source.join("b.jpg"), "b").unwrap();
        fs::write(source.join("c.jpg"), "c").unwrap();
        fs::write(sorted.join("Category_2_dogs").join("a.jpg"), "a").unwrap();
        fs::write(sorted.join("Unrelated").join("b.jpg"), "b").unwrap();

        for _ in 0..3 {
            let entries = run_scan(&source, &sorted).unwrap();
            assert_eq!(names(&entries), vec!["b.jpg", "c.jpg"]);
        }
    }

    #[test]
    fn test_scan_includes_hidden_media_by_default() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path();
        fs::write(source.join(".beach.jpg"), "x").unwrap();
        fs::write(source.join("a.jpg"), "x").unwrap();
        fs::write(source.join(".DS_Store"), "x").unwrap();

        let entries = run_scan(source, &source.join("Sorted_Media")).unwrap();
        assert_eq!(names(&entries), vec![".beach.jpg", "a.jpg"]);

        let mut rules = Settings::default().filters;
        rules.enable_hidden_files = false;
        let filters = rules.compile().unwrap();
        let entries = scan(
            source,
            &source.join("Sorted_Media"),
            &KindMapper::default(),
            &filters,
        )
        .unwrap();
        assert_eq!(names(&entries), vec!["a.jpg"]);
    }

    #[test]
    fn test_scan_invalid_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");
        let file = temp_dir.path().join("file.png");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            run_scan(&missing, temp_dir.path()),
            Err(SortError::InvalidSourceDirectory { .. })
        ));
        assert!(matches!(
            run_scan(&file, temp_dir.path()),
            Err(SortError::InvalidSourceDirectory { .. })
        ));
    }
}
