//! Rebuild mode aggregator
//!
//! Builds a fresh hash mapping from a full rescan and diffs it against the
//! store that was loaded when the session opened.

use super::store::{DedupStore, HashMapping};
use crate::pipeline::{Aggregator, FileRecord};
use log::{debug, info};

/// The three maps produced by one rebuild pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationSnapshot {
    /// Hash -> first path seen this pass
    pub new_map: HashMapping,
    /// Hash -> last later-seen path for a hash already in `new_map`
    pub duplicate_map: HashMapping,
    /// Hash -> path for hashes absent from the previous store
    pub not_present_in_old: HashMapping,
    /// Number of duplicate sightings (each overwrite in `duplicate_map` counts)
    pub duplicate_sightings: usize,
}

pub struct Reconciler<'a> {
    previous: &'a DedupStore,
    snapshot: ReconciliationSnapshot,
}

impl<'a> Reconciler<'a> {
    pub fn new(previous: &'a DedupStore) -> Self {
        Self {
            previous,
            snapshot: ReconciliationSnapshot::default(),
        }
    }
}

impl Aggregator for Reconciler<'_> {
    type Output = ReconciliationSnapshot;

    fn accept(&mut self, record: FileRecord) {
        let snapshot = &mut self.snapshot;

        if let Some(first) = snapshot.new_map.get(&record.hash) {
            info!(
                "duplicate! [{}] | [{}]",
                first.display(),
                record.path.display()
            );
            snapshot.duplicate_sightings += 1;
            snapshot.duplicate_map.insert(record.hash, record.path);
            return;
        }

        if !self.previous.contains(&record.hash) {
            debug!(
                "not in previous store: {} {}",
                record.hash.short(),
                record.path.display()
            );
            snapshot
                .not_present_in_old
                .insert(record.hash, record.path.clone());
        }
        snapshot.new_map.insert(record.hash, record.path);
    }

    fn finish(self) -> Self::Output {
        self.snapshot
    }
}
