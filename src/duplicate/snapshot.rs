//! Rebuild snapshot files
//!
//! A rebuild never touches the configured store file. Its results land next
//! to it instead:
//!
//! - `<YYYY.MM.DD.HH.MM.SS>.<store name>` - the full rebuilt mapping
//! - `duplicates.<store name>` - later sightings of already-seen content
//! - `not-in-previous.<store name>` - content missing from the old store
//!
//! Timestamped snapshots accumulate across runs and are pruned oldest-first.

use super::reconciler::ReconciliationSnapshot;
use super::store::{save_mapping, StoreError};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d.%H.%M.%S";
/// Length of a formatted timestamp, e.g. `2024.01.31.23.59.07`
const TIMESTAMP_LEN: usize = 19;

/// Where the three rebuild artifacts are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub timestamped: PathBuf,
    pub duplicates: PathBuf,
    pub not_in_previous: PathBuf,
}

impl SnapshotPaths {
    /// Artifact paths beside `store_file`, stamped with `at`
    pub fn for_store<Tz: TimeZone>(store_file: &Path, at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let dir = store_dir(store_file);
        let base = store_base_name(store_file);
        Self {
            timestamped: dir.join(timestamped_name(&base, at)),
            duplicates: dir.join(format!("duplicates.{base}")),
            not_in_previous: dir.join(format!("not-in-previous.{base}")),
        }
    }
}

/// `<YYYY.MM.DD.HH.MM.SS>.<base>`
pub fn timestamped_name<Tz: TimeZone>(base: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}.{}", at.format(TIMESTAMP_FORMAT), base)
}

fn store_dir(store_file: &Path) -> PathBuf {
    match store_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn store_base_name(store_file: &Path) -> String {
    store_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "db.json".to_string())
}

/// True if `file_name` is a timestamped snapshot of `base`
fn is_timestamped_snapshot(file_name: &str, base: &str) -> bool {
    let Some(stamp) = file_name
        .strip_suffix(base)
        .and_then(|rest| rest.strip_suffix('.'))
    else {
        return false;
    };
    stamp.len() == TIMESTAMP_LEN && NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok()
}

/// Write all three artifacts. Stops at the first failure.
pub fn write_snapshots(
    snapshot: &ReconciliationSnapshot,
    paths: &SnapshotPaths,
) -> Result<(), StoreError> {
    let artifacts = [
        (&snapshot.new_map, &paths.timestamped),
        (&snapshot.duplicate_map, &paths.duplicates),
        (&snapshot.not_present_in_old, &paths.not_in_previous),
    ];

    for (mapping, path) in artifacts {
        save_mapping(mapping, path)?;
        info!("Wrote {} entries to {}", mapping.len(), path.display());
    }

    Ok(())
}

/// Timestamped snapshots of `store_file`, oldest first
pub fn list_snapshots(store_file: &Path) -> io::Result<Vec<PathBuf>> {
    let dir = store_dir(store_file);
    let base = store_base_name(store_file);

    let mut found: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if is_timestamped_snapshot(&name.to_string_lossy(), &base) {
            found.push(entry.path());
        }
    }

    // Zero-padded stamps sort chronologically by name
    found.sort();
    Ok(found)
}

/// Delete timestamped snapshots beyond the newest `keep`.
///
/// `keep == 0` disables pruning. Returns the number of files removed.
pub fn prune_snapshots(store_file: &Path, keep: usize) -> io::Result<usize> {
    if keep == 0 {
        return Ok(0);
    }

    let snapshots = list_snapshots(store_file)?;
    if snapshots.len() <= keep {
        return Ok(0);
    }

    let excess = snapshots.len() - keep;
    let mut removed = 0;
    for old in &snapshots[..excess] {
        match fs::remove_file(old) {
            Ok(()) => {
                debug!("Pruned snapshot {}", old.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to prune snapshot {}: {}", old.display(), e),
        }
    }

    Ok(removed)
}

/// Current local time, for stamping snapshots
pub fn now() -> DateTime<Local> {
    Local::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicate::hash::hash_bytes;
    use crate::duplicate::store::DedupStore;
    use chrono::Utc;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    #[test]
    fn test_timestamped_name() {
        assert_eq!(
            timestamped_name("db.json", &at(7, 5, 3)),
            "2024.03.09.07.05.03.db.json"
        );
    }

    #[test]
    fn test_paths_beside_store() {
        let paths = SnapshotPaths::for_store(Path::new("/data/store/db.json"), &at(12, 0, 0));

        assert_eq!(
            paths.timestamped,
            PathBuf::from("/data/store/2024.03.09.12.00.00.db.json")
        );
        assert_eq!(paths.duplicates, PathBuf::from("/data/store/duplicates.db.json"));
        assert_eq!(
            paths.not_in_previous,
            PathBuf::from("/data/store/not-in-previous.db.json")
        );
    }

    #[test]
    fn test_bare_store_name_uses_current_dir() {
        let paths = SnapshotPaths::for_store(Path::new("db.json"), &at(1, 2, 3));
        assert_eq!(paths.duplicates, PathBuf::from("./duplicates.db.json"));
    }

    #[test]
    fn test_snapshot_name_recognition() {
        assert!(is_timestamped_snapshot("2024.03.09.07.05.03.db.json", "db.json"));
        assert!(!is_timestamped_snapshot("db.json", "db.json"));
        assert!(!is_timestamped_snapshot("duplicates.db.json", "db.json"));
        assert!(!is_timestamped_snapshot("2024.13.09.07.05.03.db.json", "db.json"));
        assert!(!is_timestamped_snapshot("2024.03.09.07.05.03.other.json", "db.json"));
    }

    #[test]
    fn test_write_snapshots_leaves_store_alone() {
        let temp_dir = TempDir::new().unwrap();
        let store_file = temp_dir.path().join("db.json");
        fs::write(&store_file, "{}").unwrap();

        let mut snapshot = ReconciliationSnapshot::default();
        snapshot
            .new_map
            .insert(hash_bytes(b"x"), PathBuf::from("/m/x.jpg"));
        snapshot
            .duplicate_map
            .insert(hash_bytes(b"x"), PathBuf::from("/m/x2.jpg"));

        let paths = SnapshotPaths::for_store(&store_file, &at(10, 0, 0));
        write_snapshots(&snapshot, &paths).unwrap();

        assert_eq!(fs::read_to_string(&store_file).unwrap(), "{}");
        assert_eq!(DedupStore::load(&paths.timestamped).unwrap().len(), 1);
        assert_eq!(DedupStore::load(&paths.duplicates).unwrap().len(), 1);
        assert!(DedupStore::load(&paths.not_in_previous).unwrap().is_empty());
    }

    #[test]
    fn test_prune_keeps_newest() {
        let temp_dir = TempDir::new().unwrap();
        let store_file = temp_dir.path().join("db.json");
        fs::write(&store_file, "{}").unwrap();
        fs::write(temp_dir.path().join("duplicates.db.json"), "{}").unwrap();
        for minute in 0..5 {
            let name = timestamped_name("db.json", &at(9, minute, 0));
            fs::write(temp_dir.path().join(name), "{}").unwrap();
        }

        let removed = prune_snapshots(&store_file, 2).unwrap();

        assert_eq!(removed, 3);
        let left: Vec<String> = list_snapshots(&store_file)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            left,
            vec!["2024.03.09.09.03.00.db.json", "2024.03.09.09.04.00.db.json"]
        );
        assert!(store_file.exists());
        assert!(temp_dir.path().join("duplicates.db.json").exists());
    }

    #[test]
    fn test_prune_zero_keeps_everything() {
        let temp_dir = TempDir::new().unwrap();
        let store_file = temp_dir.path().join("db.json");
        for minute in 0..3 {
            let name = timestamped_name("db.json", &at(9, minute, 0));
            fs::write(temp_dir.path().join(name), "{}").unwrap();
        }

        assert_eq!(prune_snapshots(&store_file, 0).unwrap(), 0);
        assert_eq!(list_snapshots(&store_file).unwrap().len(), 3);
    }
}
