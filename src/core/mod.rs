//! Core functionality module
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and defaults
//! - `error` - Error types and result aliases
//! - `session` - Store ownership and the two run modes

pub mod config;
pub mod error;
pub mod session;
