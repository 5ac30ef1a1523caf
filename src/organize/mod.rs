//! Filing of new content
//!
//! # Submodules
//!
//! - `classifier` - Extension to category mapping
//! - `mover` - Copy-then-delete relocation
//! - `ingest` - Ingest mode aggregator

pub mod classifier;
pub mod ingest;
pub mod mover;

pub use classifier::{Category, CategoryTable};
pub use ingest::{IngestDriver, IngestReport};
pub use mover::{move_file, MoveError};
