//! Content identity and the dedup store
//!
//! # Submodules
//!
//! - `hash` - SHA-256 content hashing
//! - `store` - Hash to canonical path mapping and its JSON persistence
//! - `reconciler` - Rebuild mode aggregator
//! - `snapshot` - Rebuild artifacts and snapshot retention

pub mod hash;
pub mod reconciler;
pub mod snapshot;
pub mod store;

pub use hash::{hash_file, ContentHash, HashError};
pub use reconciler::{ReconciliationSnapshot, Reconciler};
pub use store::{DedupStore, HashMapping, StoreError};
