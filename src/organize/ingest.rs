//! Ingest mode aggregator
//!
//! Consumes hashed files in submission order. Content already in the store
//! is reported and left where it is; new content is classified, moved into
//! its category root and registered under its new path.

use super::classifier::CategoryTable;
use super::mover::move_file;
use crate::duplicate::store::DedupStore;
use crate::pipeline::{Aggregator, FileRecord};
use log::{debug, error, info, warn};

/// Counts from one ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Files moved into a category root and registered
    pub moved: usize,
    /// Files whose content was already known
    pub duplicates: usize,
    /// Files that could not be moved (store unchanged)
    pub failed: usize,
    /// Files copied to their destination whose original could not be removed
    pub stranded: usize,
    /// Whether the updated store was written back after the run
    pub store_saved: bool,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.moved + self.duplicates + self.failed + self.stranded
    }
}

/// Aggregator driving classification and moves for new content
pub struct IngestDriver<'a> {
    store: &'a mut DedupStore,
    table: &'a CategoryTable,
    report: IngestReport,
}

impl<'a> IngestDriver<'a> {
    pub fn new(store: &'a mut DedupStore, table: &'a CategoryTable) -> Self {
        Self {
            store,
            table,
            report: IngestReport::default(),
        }
    }
}

impl Aggregator for IngestDriver<'_> {
    type Output = IngestReport;

    fn accept(&mut self, record: FileRecord) {
        if let Some(canonical) = self.store.get(&record.hash) {
            info!(
                "duplicate! [{}] | [{}]",
                canonical.display(),
                record.path.display()
            );
            self.report.duplicates += 1;
            return;
        }

        let Some(file_name) = record.path.file_name() else {
            warn!("No file name in {}, skipping", record.path.display());
            self.report.failed += 1;
            return;
        };

        let category = self.table.classify(&record.path);
        let dest = self.table.root(category).join(file_name);
        debug!(
            "{} {} -> {} ({})",
            record.hash.short(),
            record.path.display(),
            dest.display(),
            category
        );

        match move_file(&record.path, &dest) {
            Ok(()) => {
                info!("moved [{}] -> [{}]", record.path.display(), dest.display());
                self.store.insert(record.hash, dest);
                self.report.moved += 1;
            }
            Err(e) if e.left_duplicate_on_disk() => {
                error!("{}; store not updated for {}", e, record.hash);
                self.report.stranded += 1;
            }
            Err(e) => {
                error!("Failed to move {}: {}", record.path.display(), e);
                self.report.failed += 1;
            }
        }
    }

    fn finish(self) -> Self::Output {
        self.report
    }
}
