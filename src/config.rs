//! Settings for a sorting session.
//!
//! Settings are read from a TOML file. Every key is optional:
//!
//! ```toml
//! [session]
//! sorted_root = "Sorted_Media"
//! undo_capacity = 20
//! on_collision = "rename"
//!
//! [media]
//! image = ["webp", "heic"]
//! video = ["mkv"]
//! audio = []
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["IMG_*_tmp.*"]
//! extensions = ["part"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::classifier::CollisionPolicy;
use crate::media_kind::{KindMapper, MediaKind};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory settings file.
pub const LOCAL_CONFIG_FILE: &str = ".mediasortrc.toml";

/// Default name of the directory holding the category folders.
pub const DEFAULT_SORTED_ROOT: &str = "Sorted_Media";

/// Default number of undoable actions kept per session.
pub const DEFAULT_UNDO_CAPACITY: usize = 20;

/// Errors that can occur while loading settings.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Settings file not found at an explicitly given path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure, or an out-of-range value.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading the settings file.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// All settings for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub media: MediaSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Where sorted files go and how the engine behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Directory holding the category folders. Relative paths are resolved
    /// against the current directory.
    #[serde(default = "default_sorted_root")]
    pub sorted_root: PathBuf,

    /// Maximum number of actions that can be undone.
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,

    /// What to do when the destination name is already taken.
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

fn default_sorted_root() -> PathBuf {
    PathBuf::from(DEFAULT_SORTED_ROOT)
}

fn default_undo_capacity() -> usize {
    DEFAULT_UNDO_CAPACITY
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sorted_root: default_sorted_root(),
            undo_capacity: default_undo_capacity(),
            on_collision: CollisionPolicy::default(),
        }
    }
}

/// Extensions recognised on top of the built-in ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaSettings {
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub video: Vec<String>,
    #[serde(default)]
    pub audio: Vec<String>,
}

/// Rules deciding which files the scanner looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to true:
    /// a dotfile with a media extension is still media.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for keeping files out of the working set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules that force a file in regardless of exclusions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Settings {
    /// Loads settings, trying in order:
    /// 1. `config_path`, if provided
    /// 2. `.mediasortrc.toml` in the current directory
    /// 3. `~/.config/mediasort/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be read, or if the
    /// file that was found is not valid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("mediasort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Loads settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Renders the settings as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.undo_capacity == 0 {
            return Err(ConfigError::ConfigInvalid(
                "session.undo_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The sorted root as an absolute path.
    pub fn sorted_root(&self) -> PathBuf {
        std::path::absolute(&self.session.sorted_root)
            .unwrap_or_else(|_| self.session.sorted_root.clone())
    }

    /// Builds the extension mapper, including the extra extensions.
    pub fn kind_mapper(&self) -> KindMapper {
        let mut mapper = KindMapper::default();
        let extras = [
            (&self.media.image, MediaKind::Image),
            (&self.media.video, MediaKind::Video),
            (&self.media.audio, MediaKind::Audio),
        ];
        for (extensions, kind) in extras {
            for ext in extensions {
                mapper.add_extension_mapping(ext, kind);
            }
        }
        mapper
    }
}

impl FilterRules {
    /// Compiles the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_regexes = self
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledFilters {
            enable_hidden_files: self.enable_hidden_files,
            exclude_filenames: self.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: self
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(self.exclude.patterns.as_slice())?,
            exclude_regexes,
            include_patterns: compile_globs(self.include.patterns.as_slice())?,
        })
    }
}

/// Filter rules ready for matching.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    /// No rules at all; every file passes.
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

impl CompiledFilters {
    /// Checks whether a file, given by its name, may enter the working set.
    ///
    /// Include patterns win outright. Otherwise hidden files, exact names,
    /// extensions, glob patterns and regexes are checked in that order.
    pub fn should_include(&self, file_name: &Path) -> bool {
        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_name))
        {
            return true;
        }

        let name = file_name
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.enable_hidden_files && name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_name.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_name))
        {
            return false;
        }

        !self.exclude_regexes.iter().any(|regex| regex.is_match(&name))
    }
}
