/// Media kind detection for files considered during triage.
///
/// Files are tagged by their extension, compared case-insensitively. Anything
/// without a known extension is not media and never enters the working set.
///
/// # Examples
///
/// ```
/// use mediasort::media_kind::{KindMapper, MediaKind};
/// use std::path::Path;
///
/// let mapper = KindMapper::default();
/// assert_eq!(mapper.kind_of(Path::new("cat.JPG")), Some(MediaKind::Image));
/// assert_eq!(mapper.kind_of(Path::new("clip.mov")), Some(MediaKind::Video));
/// assert_eq!(mapper.kind_of(Path::new("notes.txt")), None);
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The kind of media a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still images (PNG, JPG, GIF)
    Image,
    /// Video clips (MP4, AVI, MOV)
    Video,
    /// Audio tracks (MP3, WAV, FLAC)
    Audio,
}

impl MediaKind {
    /// Returns the label shown next to a file in listings.
    ///
    /// ```
    /// use mediasort::media_kind::MediaKind;
    ///
    /// assert_eq!(MediaKind::Audio.label(), "Audio");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps file extensions to media kinds.
#[derive(Debug, Clone)]
pub struct KindMapper {
    extension_map: HashMap<String, MediaKind>,
}

impl KindMapper {
    /// Creates a new `KindMapper` with the built-in extensions.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        for ext in ["png", "jpg", "jpeg", "gif"] {
            self.add_extension_mapping(ext, MediaKind::Image);
        }
        for ext in ["mp4", "avi", "mov"] {
            self.add_extension_mapping(ext, MediaKind::Video);
        }
        for ext in ["mp3", "wav", "flac"] {
            self.add_extension_mapping(ext, MediaKind::Audio);
        }
    }

    /// Adds an extension to kind mapping. A leading dot is ignored.
    pub fn add_extension_mapping(&mut self, ext: &str, kind: MediaKind) {
        let ext = ext.trim_start_matches('.').to_lowercase();
        if !ext.is_empty() {
            self.extension_map.insert(ext, kind);
        }
    }

    /// Maps a bare extension to a kind.
    ///
    /// ```
    /// use mediasort::media_kind::{KindMapper, MediaKind};
    ///
    /// let mapper = KindMapper::default();
    /// assert_eq!(mapper.extension_to_kind("FLAC"), Some(MediaKind::Audio));
    /// ```
    pub fn extension_to_kind(&self, ext: &str) -> Option<MediaKind> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Determines the kind of a file from its path, if it is media at all.
    pub fn kind_of(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?;
        self.extension_to_kind(ext)
    }
}

impl Default for KindMapper {
    fn default() -> Self {
        Self::new()
    }
}
