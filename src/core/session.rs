//! Run session
//!
//! A `Session` owns the configuration and the dedup store for one process
//! run. It is built once at startup and drives exactly one of the two run
//! modes:
//!
//! - **ingest**: hash the given files, move new content into the category
//!   roots, then write the store back once.
//! - **rebuild**: rescan the category trees, replace the in-memory store with
//!   the result and write snapshot files beside the store. The store file
//!   itself is left untouched.

use crate::core::config::{non_overlapping_directories, Config};
use crate::core::error::Result;
use crate::duplicate::reconciler::{ReconciliationSnapshot, Reconciler};
use crate::duplicate::snapshot::{self, SnapshotPaths};
use crate::duplicate::store::DedupStore;
use crate::organize::classifier::CategoryTable;
use crate::organize::ingest::{IngestDriver, IngestReport};
use crate::pipeline::{available_cores, HashPool, PathSource, PipelineProgress, PipelineReport};
use log::{error, info, warn};
use std::fs;
use std::path::PathBuf;

/// Outcome of a rebuild run
#[derive(Debug, Clone)]
pub struct RebuildReport {
    /// Roots that were walked
    pub roots: Vec<PathBuf>,
    /// Distinct hashes found
    pub unique: usize,
    /// Hashes seen more than once, with the last duplicate path for each
    pub duplicates: Vec<PathBuf>,
    /// Total duplicate sightings
    pub duplicate_sightings: usize,
    /// Hashes absent from the previous store
    pub not_in_previous: usize,
    /// Snapshot artifacts written (or attempted)
    pub snapshots: SnapshotPaths,
    /// Whether all snapshot artifacts were written
    pub snapshots_written: bool,
    /// Timestamped snapshots removed by retention
    pub pruned: usize,
    /// Pipeline counters
    pub pipeline: PipelineReport,
}

/// Configuration plus dedup store for one run
#[derive(Debug)]
pub struct Session {
    config: Config,
    store: DedupStore,
}

impl Session {
    /// Load the store named by the configuration.
    ///
    /// A malformed or unreadable store is fatal; a missing one starts empty.
    pub fn open(config: Config) -> Result<Self> {
        let store = DedupStore::load(&config.store_file)?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// Pool sized for `source`, capped by `pipeline.workers` when set
    fn pool_for(&self, source: &PathSource) -> HashPool {
        let cores = self
            .config
            .pipeline
            .workers
            .filter(|&n| n > 0)
            .unwrap_or_else(available_cores);
        HashPool::for_source(source, cores)
    }

    /// Ingest mode.
    ///
    /// The store is written back once after the pipeline drains. A failure to
    /// write it is logged and reported through `IngestReport::store_saved`;
    /// the run itself still completes.
    pub fn ingest<F>(
        &mut self,
        paths: Vec<PathBuf>,
        on_progress: F,
    ) -> Result<(IngestReport, PipelineReport)>
    where
        F: FnMut(&PipelineProgress),
    {
        self.ensure_category_roots();

        let table = CategoryTable::from_config(&self.config);
        let count = paths.len();
        let source = PathSource::List(paths);
        let pool = self.pool_for(&source);
        info!("Ingesting {} file(s) with {} worker(s)", count, pool.workers());

        let (mut report, pipeline) = {
            let driver = IngestDriver::new(&mut self.store, &table);
            pool.run(source, driver, on_progress)?
        };

        info!(
            "Ingest finished: {} moved, {} duplicate(s), {} failed, {} unreadable",
            report.moved, report.duplicates, report.failed, pipeline.failed
        );
        if report.stranded > 0 {
            error!(
                "{} file(s) were copied but their originals could not be removed; \
                 the store does not record them",
                report.stranded
            );
        }

        report.store_saved = match self.store.save(&self.config.store_file) {
            Ok(()) => true,
            Err(e) => {
                error!("{}; moves from this run are not recorded", e);
                false
            }
        };

        if let Some(target) = &self.config.save_config_to {
            if let Err(e) = self.config.save(target) {
                warn!("{}", e);
            }
        }

        Ok((report, pipeline))
    }

    /// Rebuild mode.
    ///
    /// `roots` overrides the configured rebuild roots when non-empty.
    pub fn rebuild<F>(&mut self, roots: Vec<PathBuf>, on_progress: F) -> Result<RebuildReport>
    where
        F: FnMut(&PipelineProgress),
    {
        let roots = if roots.is_empty() {
            self.config.rebuild_roots()
        } else {
            non_overlapping_directories(roots)
        };
        for root in &roots {
            info!("Rebuild root: {}", root.display());
        }

        let source = PathSource::Walk(roots.clone());
        let pool = self.pool_for(&source);

        let (reconciled, pipeline) = {
            let reconciler = Reconciler::new(&self.store);
            pool.run(source, reconciler, on_progress)?
        };

        let paths = SnapshotPaths::for_store(&self.config.store_file, &snapshot::now());
        let snapshots_written = match snapshot::write_snapshots(&reconciled, &paths) {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        };

        let pruned = if snapshots_written {
            let keep = self.config.rebuild.keep_snapshots;
            match snapshot::prune_snapshots(&self.config.store_file, keep) {
                Ok(n) => n,
                Err(e) => {
                    warn!("Failed to prune old snapshots: {}", e);
                    0
                }
            }
        } else {
            0
        };

        let report = summarize(roots, &reconciled, paths, snapshots_written, pruned, pipeline);
        log_rebuild_summary(&report);

        self.store.replace(reconciled.new_map);
        Ok(report)
    }

    /// Create any missing category roots. Failures are logged; the mover
    /// reports the affected files individually.
    fn ensure_category_roots(&self) {
        for root in self.config.category_roots() {
            if root.is_dir() {
                continue;
            }
            match fs::create_dir_all(root) {
                Ok(()) => info!("Created {}", root.display()),
                Err(e) => error!("Failed to create {}: {}", root.display(), e),
            }
        }
    }
}

fn summarize(
    roots: Vec<PathBuf>,
    snapshot: &ReconciliationSnapshot,
    snapshots: SnapshotPaths,
    snapshots_written: bool,
    pruned: usize,
    pipeline: PipelineReport,
) -> RebuildReport {
    RebuildReport {
        roots,
        unique: snapshot.new_map.len(),
        duplicates: snapshot.duplicate_map.values().cloned().collect(),
        duplicate_sightings: snapshot.duplicate_sightings,
        not_in_previous: snapshot.not_present_in_old.len(),
        snapshots,
        snapshots_written,
        pruned,
        pipeline,
    }
}

fn log_rebuild_summary(report: &RebuildReport) {
    info!(
        "Rebuild finished: {} file(s) hashed, {} unique, {} not in previous store",
        report.pipeline.records, report.unique, report.not_in_previous
    );
    info!(
        "{} duplicate sighting(s) across {} hash(es)",
        report.duplicate_sightings,
        report.duplicates.len()
    );
    for path in &report.duplicates {
        info!("  duplicate: {}", path.display());
    }
    if report.pruned > 0 {
        info!("Pruned {} old snapshot(s)", report.pruned);
    }
}
