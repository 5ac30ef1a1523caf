//! Error types for the media sorter
//!
//! Each concern owns a focused error enum. Per-file failures (`HashError`,
//! `MoveError`) are logged where they happen; `SorterError` wraps only the
//! ones that abort a run, so session callers can propagate with `?`.

use crate::core::config::ConfigError;
use crate::duplicate::store::StoreError;
use crate::pipeline::PipelineError;
use thiserror::Error;

/// Crate-level error type
#[derive(Error, Debug)]
pub enum SorterError {
    /// Configuration could not be loaded or saved
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dedup store could not be loaded or saved
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The hashing pipeline failed as a whole (not a single file)
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SorterError>;
