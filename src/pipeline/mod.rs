//! Concurrent hashing pipeline
//!
//! ```text
//!  PathSource ──(bounded path queue)──▶ hash-worker-0..P ──(bounded result queue)──▶ Aggregator
//!   producer thread                       P threads                                  calling thread
//! ```
//!
//! The pipeline does not know which run mode it serves. Whatever consumes
//! the hashed files implements [`Aggregator`]; all mutation of shared state
//! (the dedup store) happens inside that single consumer, so no locking is
//! needed.
//!
//! Every path gets a submission sequence number at the source. Workers finish
//! in arbitrary order, but records are handed to the aggregator in sequence
//! order, which makes "first seen" well defined for duplicates found within a
//! single batch.
//!
//! # Submodules
//!
//! - `source` - Path producers (explicit list or directory walk)
//! - `pool` - Fixed-size hash worker pool with a join barrier

pub mod pool;
pub mod source;

pub use pool::{available_cores, worker_count, HashPool};
pub use source::PathSource;

use crate::duplicate::hash::ContentHash;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A successfully hashed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Submission sequence number assigned by the path source
    pub seq: u64,
    /// Path the content was read from
    pub path: PathBuf,
    /// SHA-256 of the full content
    pub hash: ContentHash,
}

/// Single-threaded consumer of pipeline output
pub trait Aggregator {
    type Output;

    /// Handle one hashed file. Called in submission order.
    fn accept(&mut self, record: FileRecord);

    /// Called once after the result queue is closed and drained
    fn finish(self) -> Self::Output;
}

/// Running counters reported to the progress callback
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineProgress {
    /// Paths whose hashing attempt has completed (success or failure)
    pub processed: u64,
    /// Paths that could not be hashed
    pub failed: u64,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Number of hash workers used
    pub workers: usize,
    /// Paths emitted by the source
    pub queued: u64,
    /// Records delivered to the aggregator
    pub records: u64,
    /// Paths dropped because they could not be opened or read
    pub failed: u64,
    /// Errors encountered while walking directories
    pub walk_errors: usize,
    /// Workers that panicked (their in-flight path produced no record)
    pub panicked_workers: usize,
}

/// Failures of the pipeline as a whole
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to spawn {thread} thread: {source}")]
    Spawn { thread: String, source: io::Error },
}
