//! Media Sorter - CLI Entry Point
//!
//! This binary is a thin wrapper around the library, handling argument parsing,
//! logging setup, and command dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};
use media_sorter::cli::{self, Args, DualWriter};
use media_sorter::core::config::{Config, LoggingConfig};
use std::fs::OpenOptions;
use std::io::Write;

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration; a broken config aborts before any file is touched
    let mut config = if args.needs_config() {
        Config::load(&args.config)
            .with_context(|| format!("Failed to load config {}", args.config.display()))?
    } else {
        Config::default()
    };

    // Apply CLI overrides to config
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(workers) = args.workers {
        config.pipeline.workers = Some(workers);
    }

    init_logging(&config.logging)?;

    info!("{} v{}", media_sorter::NAME, media_sorter::VERSION);

    // Run the command
    cli::run_command(&args, config)?;

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let log_level = match logging.level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    if logging.log_to_file {
        // Set up logging to both console and file
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.log_file)
            .with_context(|| format!("Failed to open log file {}", logging.log_file.display()))?;

        Builder::new()
            .filter_level(log_level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {} {}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .target(env_logger::Target::Pipe(Box::new(DualWriter {
                console: std::io::stderr(),
                file: log_file,
            })))
            .init();

        info!("Logging to file: {}", logging.log_file.display());
    } else {
        Builder::from_env(env_logger::Env::default().default_filter_or(&logging.level)).init();
    }

    Ok(())
}
