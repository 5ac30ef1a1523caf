//! Media Sorter Library
//!
//! Files a batch of media into category folders by content identity, or
//! rebuilds the record of known content by rescanning those folders.
//!
//! # Architecture
//!
//! - [`pipeline`] - Path source, hash worker pool and the `Aggregator` seam
//! - [`duplicate`] - SHA-256 content hashing, the dedup store, and rebuild
//!   reconciliation with its snapshot files
//! - [`organize`] - Extension classifier, verified mover, and the ingest
//!   aggregator
//! - [`core`] - Configuration, error types and the run `Session`
//! - [`cli`] - Command-line interface (only used by the binary)
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use media_sorter::core::config::Config;
//! use media_sorter::core::session::Session;
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("cfg.json")?;
//!     let mut session = Session::open(config)?;
//!
//!     let (report, _) = session.ingest(vec![PathBuf::from("inbox/a.jpg")], |_| {})?;
//!     println!("moved {}, duplicates {}", report.moved, report.duplicates);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod duplicate;
pub mod organize;
pub mod pipeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
