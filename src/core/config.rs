//! Configuration module for the media sorter
//!
//! The configuration names the dedup store file, the four category
//! destination roots and a handful of tuning knobs. It is loaded once at
//! startup from either a JSON file (the legacy `cfg.json` layout, whose keys
//! are accepted as aliases) or a TOML file, chosen by file extension.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "cfg.json";

/// Default number of timestamped rebuild snapshots to keep
const DEFAULT_KEEP_SNAPSHOTS: usize = 10;

/// On-disk format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension (`.toml` or JSON otherwise)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the dedup store (hash -> canonical path JSON object)
    #[serde(alias = "db")]
    pub store_file: PathBuf,

    /// Where to write this configuration back after an ingest run
    #[serde(alias = "cfg", skip_serializing_if = "Option::is_none")]
    pub save_config_to: Option<PathBuf>,

    /// Destination root for image files
    pub images: PathBuf,

    /// Destination root for audio files
    #[serde(alias = "music")]
    pub audio: PathBuf,

    /// Destination root for video files
    pub videos: PathBuf,

    /// Destination root for everything else
    pub unknown: PathBuf,

    /// Extension lists per category
    pub categories: CategoryExtensions,

    /// Hashing pipeline settings
    pub pipeline: PipelineConfig,

    /// Rebuild mode settings
    pub rebuild: RebuildConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Extension lists mapping files to categories.
///
/// Matching is exact and case-sensitive, including the leading dot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryExtensions {
    pub image: Vec<String>,
    pub audio: Vec<String>,
    pub video: Vec<String>,
}

/// Hashing pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on hash workers (defaults to the number of CPU cores)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

/// Rebuild mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Directory trees to rescan (empty = the four category roots)
    pub roots: Vec<PathBuf>,

    /// Number of timestamped snapshots to keep (0 = keep all)
    pub keep_snapshots: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file as well as the console
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_file: PathBuf::from("db.json"),
            save_config_to: None,
            images: PathBuf::from("./sorted/images"),
            audio: PathBuf::from("./sorted/audio"),
            videos: PathBuf::from("./sorted/videos"),
            unknown: PathBuf::from("./sorted/unknown"),
            categories: CategoryExtensions::default(),
            pipeline: PipelineConfig::default(),
            rebuild: RebuildConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CategoryExtensions {
    fn default() -> Self {
        Self {
            image: vec![".jpg".to_string(), ".png".to_string()],
            audio: vec![".flac".to_string(), ".mp3".to_string()],
            video: vec![".mov".to_string(), ".mp4".to_string(), ".webm".to_string()],
        }
    }
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            keep_snapshots: DEFAULT_KEEP_SNAPSHOTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("media_sorter.log"),
        }
    }
}

impl Config {
    /// Load configuration from a JSON or TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        let config: Config = match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?,
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?,
        };

        Ok(config)
    }

    /// Save configuration, in the format implied by the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::SerializeError(e.to_string()))?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::SerializeError(e.to_string()))?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(parent.to_path_buf(), e.to_string()))?;
        }

        fs::write(path, content)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e.to_string()))?;

        Ok(())
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }

    /// The four category roots, in image/audio/video/unknown order
    pub fn category_roots(&self) -> [&Path; 4] {
        [&self.images, &self.audio, &self.videos, &self.unknown]
    }

    /// Directory trees scanned by a rebuild.
    ///
    /// Falls back to the category roots when none are configured. Nested
    /// roots are collapsed so no file is hashed twice.
    pub fn rebuild_roots(&self) -> Vec<PathBuf> {
        let roots: Vec<PathBuf> = if self.rebuild.roots.is_empty() {
            self.category_roots()
                .iter()
                .map(|p| p.to_path_buf())
                .collect()
        } else {
            self.rebuild.roots.clone()
        };
        non_overlapping_directories(roots)
    }
}

/// Remove directories that are subdirectories of (or equal to) others in the list.
pub fn non_overlapping_directories(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for dir in dirs {
        if result.iter().any(|kept| dir.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(&dir));
        result.push(dir);
    }

    result
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file
    ParseError(PathBuf, String),
    /// Failed to serialize configuration
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ParseError(path, err) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(
                    f,
                    "Failed to write config file '{}': {}",
                    path.display(),
                    err
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.store_file, PathBuf::from("db.json"));
        assert!(config.save_config_to.is_none());
        assert_eq!(config.categories.image, vec![".jpg", ".png"]);
        assert_eq!(config.categories.audio, vec![".flac", ".mp3"]);
        assert_eq!(config.categories.video, vec![".mov", ".mp4", ".webm"]);
        assert!(config.pipeline.workers.is_none());
        assert_eq!(config.rebuild.keep_snapshots, DEFAULT_KEEP_SNAPSHOTS);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_legacy_json_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{
                "db": "/data/db.json",
                "cfg": "/data/cfg.json",
                "videos": "/media/videos",
                "music": "/media/music",
                "images": "/media/images",
                "unknown": "/media/unknown"
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.store_file, PathBuf::from("/data/db.json"));
        assert_eq!(config.save_config_to, Some(PathBuf::from("/data/cfg.json")));
        assert_eq!(config.audio, PathBuf::from("/media/music"));
        assert_eq!(config.videos, PathBuf::from("/media/videos"));
        assert_eq!(config.images, PathBuf::from("/media/images"));
        assert_eq!(config.unknown, PathBuf::from("/media/unknown"));
        // Sections not present fall back to defaults
        assert_eq!(config.categories, CategoryExtensions::default());
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sorter.toml");
        fs::write(
            &path,
            r#"
store_file = "/data/db.json"
images = "/media/images"

[categories]
image = [".jpg", ".jpeg"]

[pipeline]
workers = 2

[rebuild]
roots = ["/media"]
keep_snapshots = 3
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.store_file, PathBuf::from("/data/db.json"));
        assert_eq!(config.categories.image, vec![".jpg", ".jpeg"]);
        assert_eq!(config.categories.audio, vec![".flac", ".mp3"]);
        assert_eq!(config.pipeline.workers, Some(2));
        assert_eq!(config.rebuild.roots, vec![PathBuf::from("/media")]);
        assert_eq!(config.rebuild.keep_snapshots, 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/cfg.json");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfg.json");
        fs::write(&path, "{ not json").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_, _))));
    }

    #[test]
    fn test_save_and_reload_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cfg.json");

        let mut config = Config::default();
        config.store_file = PathBuf::from("/srv/store.json");
        config.pipeline.workers = Some(4);
        config.save(&path).unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.store_file, PathBuf::from("/srv/store.json"));
        assert_eq!(reloaded.pipeline.workers, Some(4));
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&Config::generate_default_config()).unwrap();
        assert_eq!(config.categories, CategoryExtensions::default());
    }

    #[test]
    fn test_rebuild_roots_default_to_category_roots() {
        let config = Config::default();
        let roots = config.rebuild_roots();
        assert_eq!(roots.len(), 4);
        assert!(roots.contains(&PathBuf::from("./sorted/images")));
    }

    #[test]
    fn test_rebuild_roots_collapse_nested() {
        let mut config = Config::default();
        config.rebuild.roots = vec![
            PathBuf::from("/media/images"),
            PathBuf::from("/media"),
            PathBuf::from("/archive"),
            PathBuf::from("/media/videos"),
        ];

        let roots = config.rebuild_roots();
        assert_eq!(roots, vec![PathBuf::from("/media"), PathBuf::from("/archive")]);
    }
}
