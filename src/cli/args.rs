//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sort media files into category folders, skipping content already filed
#[derive(Parser, Debug)]
#[command(name = "media-sorter")]
#[command(version)]
#[command(about = "Sort media files into category folders by content hash, skipping duplicates", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file (JSON or TOML)
    #[arg(short, long, global = true, default_value = crate::core::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log level (overrides config)
    #[arg(short, long, global = true, value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: Option<String>,

    /// Maximum number of hash workers (overrides config)
    #[arg(short, long, global = true, value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Hide the progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hash the given files and move new content into the category folders
    Ingest {
        /// Files to ingest
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,
    },

    /// Rescan the category folders and write fresh store snapshots
    ///
    /// The configured store file is not modified. Results are written
    /// beside it as a timestamped snapshot plus `duplicates.*` and
    /// `not-in-previous.*` files.
    Rebuild {
        /// Directory to scan instead of the configured roots (repeatable)
        #[arg(long = "root", value_name = "DIR")]
        roots: Vec<PathBuf>,
    },

    /// Show current configuration
    ShowConfig,

    /// Write a commented configuration template
    GenerateConfig {
        /// Output path for the config file
        #[arg(short, long, default_value = "media-sorter.toml")]
        output: PathBuf,
    },
}

impl Args {
    /// Whether the selected command needs the configuration file to exist
    pub fn needs_config(&self) -> bool {
        matches!(
            self.command,
            Some(Commands::Ingest { .. }) | Some(Commands::Rebuild { .. }) | Some(Commands::ShowConfig)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_ingest_with_global_overrides() {
        let args = Args::try_parse_from([
            "media-sorter",
            "--config",
            "other.toml",
            "ingest",
            "a.jpg",
            "b.mp3",
            "--workers",
            "3",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("other.toml"));
        assert_eq!(args.workers, Some(3));
        assert!(args.needs_config());
        match args.command {
            Some(Commands::Ingest { files }) => {
                assert_eq!(files, vec![PathBuf::from("a.jpg"), PathBuf::from("b.mp3")])
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_default_config_path() {
        let args = Args::try_parse_from(["media-sorter", "show-config"]).unwrap();
        assert_eq!(args.config, PathBuf::from("cfg.json"));
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Args::try_parse_from(["media-sorter", "ingest"]).is_err());
    }

    #[test]
    fn test_rebuild_roots() {
        let args = Args::try_parse_from([
            "media-sorter",
            "rebuild",
            "--root",
            "/a",
            "--root",
            "/b",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Rebuild { roots }) => {
                assert_eq!(roots, vec![PathBuf::from("/a"), PathBuf::from("/b")])
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand_needs_no_config() {
        let args = Args::try_parse_from(["media-sorter"]).unwrap();
        assert!(args.command.is_none());
        assert!(!args.needs_config());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Args::try_parse_from(["media-sorter", "-l", "loud", "show-config"]).is_err());
    }
}
