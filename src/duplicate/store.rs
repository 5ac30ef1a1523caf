//! Dedup store
//!
//! In-memory mapping from content hash to the canonical path holding that
//! content. The store is loaded once when a session opens, mutated only by
//! the single aggregator of a run, and written back wholesale at the end.
//!
//! # Persisted format
//!
//! A single JSON object mapping 64-character hex digests to path strings:
//!
//! ```json
//! {
//!   "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f": "/media/images/a.jpg"
//! }
//! ```
//!
//! Exactly one top-level value is accepted. A file holding a second JSON
//! value (or any other trailing data) is rejected as malformed rather than
//! merged. A missing file, or one containing only whitespace, loads as an
//! empty store.

use crate::duplicate::hash::ContentHash;
use log::{info, warn};
use std::collections::btree_map::{self, BTreeMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Mapping type shared by the store and reconciliation snapshots
pub type HashMapping = BTreeMap<ContentHash, PathBuf>;

/// Dedup store persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read store file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Malformed store file '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize store: {0}")]
    Serialize(String),

    #[error("Failed to write store file '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Content hash -> canonical path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupStore {
    entries: HashMapping,
}

impl DedupStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from its persisted JSON form.
    ///
    /// Only a missing file counts as a first run; any other read failure
    /// (unreachable parent, permissions) is an error.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Store file {} does not exist yet, starting empty",
                    path.display()
                );
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let store = Self::from_json(&json).map_err(|message| StoreError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        info!("Store loaded: {} entries from {}", store.len(), path.display());
        Ok(store)
    }

    /// Parse a single JSON object; trailing values are an error
    fn from_json(json: &str) -> Result<Self, String> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }

        let entries: HashMapping = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(Self { entries })
    }

    /// Persist the store as one JSON object
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_mapping(&self.entries, path)?;
        info!("Store saved: {} entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Canonical path recorded for a hash, if any
    pub fn get(&self, hash: &ContentHash) -> Option<&Path> {
        self.entries.get(hash).map(PathBuf::as_path)
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.entries.contains_key(hash)
    }

    /// Register a new canonical path.
    ///
    /// Returns `false` and leaves the store untouched if the hash is already
    /// known, so a hash never gains a second canonical path.
    pub fn insert(&mut self, hash: ContentHash, path: PathBuf) -> bool {
        match self.entries.entry(hash) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(path);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Replace the whole mapping (used after a rebuild)
    pub fn replace(&mut self, entries: HashMapping) {
        self.entries = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write a hash mapping as a pretty-printed JSON object
pub fn save_mapping(mapping: &HashMapping, path: &Path) -> Result<(), StoreError> {
    let json =
        serde_json::to_string_pretty(mapping).map_err(|e| StoreError::Serialize(e.to_string()))?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, json).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
