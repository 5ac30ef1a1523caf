//! Extension-based classification
//!
//! Maps a file's extension to one of four destination categories. Matching
//! is exact and case-sensitive against the configured lists, so `photo.JPG`
//! lands in `unknown` unless `.JPG` is configured explicitly.

use crate::core::config::{CategoryExtensions, Config};
use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Destination category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Image,
    Audio,
    Video,
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Image => "image",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Extension (with leading dot) of the final path component.
///
/// `"a/b.tar.gz"` gives `".gz"`, `"README"` gives `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Extension lookup table
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    map: HashMap<String, Category>,
}

impl ExtensionTable {
    pub fn new(extensions: &CategoryExtensions) -> Self {
        let mut map = HashMap::new();
        let groups = [
            (&extensions.image, Category::Image),
            (&extensions.audio, Category::Audio),
            (&extensions.video, Category::Video),
        ];
        for (list, category) in groups {
            for ext in list {
                // First listing wins if an extension is configured twice
                map.entry(ext.clone()).or_insert(category);
            }
        }
        Self { map }
    }

    /// Category for an exact extension string
    pub fn lookup(&self, extension: &str) -> Category {
        self.map
            .get(extension)
            .copied()
            .unwrap_or(Category::Unknown)
    }

    /// Classify a path, warning on unrecognized extensions
    pub fn classify(&self, path: &Path) -> Category {
        let extension = extension_of(path);
        let category = self.lookup(&extension);
        if category == Category::Unknown {
            warn!(
                "unknown extension [{}] | [{}]",
                extension,
                path.display()
            );
        }
        category
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self::new(&CategoryExtensions::default())
    }
}

/// Extension table plus the four destination roots
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extensions: ExtensionTable,
    image_root: PathBuf,
    audio_root: PathBuf,
    video_root: PathBuf,
    unknown_root: PathBuf,
}

impl CategoryTable {
    pub fn from_config(config: &Config) -> Self {
        Self {
            extensions: ExtensionTable::new(&config.categories),
            image_root: config.images.clone(),
            audio_root: config.audio.clone(),
            video_root: config.videos.clone(),
            unknown_root: config.unknown.clone(),
        }
    }

    pub fn classify(&self, path: &Path) -> Category {
        self.extensions.classify(path)
    }

    /// Destination root for a category
    pub fn root(&self, category: Category) -> &Path {
        match category {
            Category::Image => &self.image_root,
            Category::Audio => &self.audio_root,
            Category::Video => &self.video_root,
            Category::Unknown => &self.unknown_root,
        }
    }
}
