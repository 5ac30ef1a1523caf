//! Hash worker pool
//!
//! `P` named worker threads share one bounded path queue. Each worker streams
//! a file through SHA-256 and pushes a result slot into a bounded result
//! queue. A supervisor thread joins every worker before dropping the last
//! result sender, so the aggregator sees the queue close only after all
//! workers have terminated.

use super::source::{PathSource, QueuedPath, SourceStats};
use super::{Aggregator, FileRecord, PipelineError, PipelineProgress, PipelineReport};
use crate::duplicate::hash::hash_file;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, trace, warn};
use std::collections::BTreeMap;
use std::thread;

/// Outcome of one hashing attempt. `record` is `None` when the file could
/// not be read; the slot still travels so sequencing never stalls.
#[derive(Debug)]
struct HashSlot {
    seq: u64,
    record: Option<FileRecord>,
}

#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    hashed: u64,
    failed: u64,
}

/// Number of CPU cores available to this process
pub fn available_cores() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// `min(cores, max(1, input_count))`, or `cores` when the input size is unknown
pub fn worker_count(cores: usize, input_count: Option<usize>) -> usize {
    let cores = cores.max(1);
    match input_count {
        Some(n) => cores.min(n.max(1)),
        None => cores,
    }
}

/// Fixed-size pool of hash workers
#[derive(Debug, Clone, Copy)]
pub struct HashPool {
    workers: usize,
}

impl HashPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Size the pool for a source, capped at `cores`
    pub fn for_source(source: &PathSource, cores: usize) -> Self {
        Self::new(worker_count(cores, source.len_hint()))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run the pipeline to completion.
    ///
    /// The aggregator and the progress callback run on the calling thread.
    /// Records reach the aggregator in submission order; unreadable paths
    /// are logged by the worker and never reach it. A read that never
    /// returns (a FIFO, a hung mount) therefore holds back delivery of every
    /// later record, not just one worker's share of the input.
    pub fn run<A, F>(
        &self,
        source: PathSource,
        mut aggregator: A,
        mut on_progress: F,
    ) -> Result<(A::Output, PipelineReport), PipelineError>
    where
        A: Aggregator,
        F: FnMut(&PipelineProgress),
    {
        let workers = self.workers;
        debug!("Starting hash pool with {} worker(s)", workers);

        thread::scope(|scope| {
            let (path_tx, path_rx) = bounded::<QueuedPath>(workers);
            let (slot_tx, slot_rx) = bounded::<HashSlot>(workers);

            let producer = thread::Builder::new()
                .name("path-producer".to_string())
                .spawn_scoped(scope, move || source.produce(path_tx))
                .map_err(|e| PipelineError::Spawn {
                    thread: "path-producer".to_string(),
                    source: e,
                })?;

            let mut handles = Vec::with_capacity(workers);
            for idx in 0..workers {
                let rx = path_rx.clone();
                let tx = slot_tx.clone();
                let name = format!("hash-worker-{idx}");
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, move || hash_worker(rx, tx))
                    .map_err(|e| PipelineError::Spawn {
                        thread: name,
                        source: e,
                    })?;
                handles.push(handle);
            }
            // Workers own the only remaining readers of the path queue
            drop(path_rx);

            let joiner = thread::Builder::new()
                .name("hash-pool-join".to_string())
                .spawn_scoped(scope, move || {
                    let mut totals = WorkerStats::default();
                    let mut panicked = 0usize;
                    for handle in handles {
                        match handle.join() {
                            Ok(stats) => {
                                totals.hashed += stats.hashed;
                                totals.failed += stats.failed;
                            }
                            Err(_) => panicked += 1,
                        }
                    }
                    // Last sender: the result queue closes here
                    drop(slot_tx);
                    (totals, panicked)
                })
                .map_err(|e| PipelineError::Spawn {
                    thread: "hash-pool-join".to_string(),
                    source: e,
                })?;

            let mut progress = PipelineProgress::default();
            let mut resequencer = Resequencer::default();
            let mut records = 0u64;

            for slot in slot_rx.iter() {
                progress.processed += 1;
                if slot.record.is_none() {
                    progress.failed += 1;
                }
                resequencer.push(slot);
                resequencer.drain_ready(|record| {
                    records += 1;
                    aggregator.accept(record);
                });
                on_progress(&progress);
            }

            if resequencer.pending() > 0 {
                warn!(
                    "{} result(s) arrived after a missing sequence number, delivering in order",
                    resequencer.pending()
                );
                resequencer.drain_all(|record| {
                    records += 1;
                    aggregator.accept(record);
                });
            }

            let source_stats = producer.join().unwrap_or_else(|_| {
                error!("Path producer panicked");
                SourceStats::default()
            });
            let (totals, panicked_workers) = joiner.join().unwrap_or_else(|_| {
                error!("Hash pool supervisor panicked");
                (WorkerStats::default(), workers)
            });

            if panicked_workers > 0 {
                error!("{} hash worker(s) panicked", panicked_workers);
            }

            let report = PipelineReport {
                workers,
                queued: source_stats.emitted,
                records,
                failed: progress.failed,
                walk_errors: source_stats.walk_errors,
                panicked_workers,
            };
            debug!(
                "Hash pool finished: {} queued, {} hashed, {} failed",
                report.queued, totals.hashed, totals.failed
            );

            Ok((aggregator.finish(), report))
        })
    }
}

fn hash_worker(paths: Receiver<QueuedPath>, results: Sender<HashSlot>) -> WorkerStats {
    let mut stats = WorkerStats::default();

    for queued in paths.iter() {
        let record = match hash_file(&queued.path) {
            Ok(hash) => {
                trace!("{} {}", hash.short(), queued.path.display());
                stats.hashed += 1;
                Some(FileRecord {
                    seq: queued.seq,
                    path: queued.path,
                    hash,
                })
            }
            Err(e) => {
                error!("{}", e);
                stats.failed += 1;
                None
            }
        };

        if results
            .send(HashSlot {
                seq: queued.seq,
                record,
            })
            .is_err()
        {
            break;
        }
    }

    stats
}

/// Reorders out-of-order slots back into submission order
#[derive(Debug, Default)]
struct Resequencer {
    next: u64,
    waiting: BTreeMap<u64, Option<FileRecord>>,
}

impl Resequencer {
    fn push(&mut self, slot: HashSlot) {
        self.waiting.insert(slot.seq, slot.record);
    }

    /// Release every slot that continues the contiguous run from `next`
    fn drain_ready(&mut self, mut deliver: impl FnMut(FileRecord)) {
        while let Some(record) = self.waiting.remove(&self.next) {
            self.next += 1;
            if let Some(record) = record {
                deliver(record);
            }
        }
    }

    /// Release whatever is left, in order, skipping gaps
    fn drain_all(&mut self, mut deliver: impl FnMut(FileRecord)) {
        for (_, record) in std::mem::take(&mut self.waiting) {
            if let Some(record) = record {
                deliver(record);
            }
        }
    }

    fn pending(&self) -> usize {
        self.waiting.len()
    }
}
