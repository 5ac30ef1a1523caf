//! Command handlers
//!
//! Thin wrappers that open a session, drive it with a progress display and
//! print a summary. All real work lives in the library modules.

use crate::cli::args::{Args, Commands};
use crate::cli::progress::{
    format_duration, print_header, print_info, print_success, print_warning, HashProgress,
};
use crate::core::config::Config;
use crate::core::session::Session;
use anyhow::{Context, Result};
use clap::CommandFactory;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Run the selected command
pub fn run_command(args: &Args, config: Config) -> Result<()> {
    match &args.command {
        Some(Commands::Ingest { files }) => ingest(config, files.clone(), args.no_progress),
        Some(Commands::Rebuild { roots }) => rebuild(config, roots.clone(), args.no_progress),
        Some(Commands::ShowConfig) => {
            show_config(&config, &args.config);
            Ok(())
        }
        Some(Commands::GenerateConfig { output }) => generate_config_file(output),
        None => {
            Args::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn progress_for(total: Option<u64>, hide: bool) -> HashProgress {
    if hide {
        HashProgress::hidden()
    } else {
        HashProgress::new(total)
    }
}

/// Ingest mode
pub fn ingest(config: Config, files: Vec<PathBuf>, hide_progress: bool) -> Result<()> {
    let mut session = Session::open(config).context("Failed to open dedup store")?;

    let progress = progress_for(Some(files.len() as u64), hide_progress);
    let outcome = session.ingest(files, |p| progress.update(p));
    let (report, pipeline) = match outcome {
        Ok(done) => {
            progress.finish();
            done
        }
        Err(e) => {
            progress.finish_with_error("ingest failed");
            return Err(e).context("Ingest failed");
        }
    };

    print_header("INGEST COMPLETE");
    print_success(&format!("Moved:       {}", report.moved));
    print_info(&format!("Duplicates:  {}", report.duplicates));
    if report.failed > 0 {
        print_warning(&format!("Not moved:   {}", report.failed));
    }
    if pipeline.failed > 0 {
        print_warning(&format!("Unreadable:  {}", pipeline.failed));
    }
    if report.stranded > 0 {
        print_warning(&format!(
            "Copied but original not removed: {} (not recorded in store)",
            report.stranded
        ));
    }
    if report.store_saved {
        print_info(&format!(
            "Store: {} entries in {}",
            session.store().len(),
            session.config().store_file.display()
        ));
    } else {
        print_warning(&format!(
            "Store could not be saved to {}, see log; moves from this run are not recorded",
            session.config().store_file.display()
        ));
    }
    print_info(&format!("Time:        {}", format_duration(progress.elapsed())));

    Ok(())
}

/// Rebuild mode
pub fn rebuild(config: Config, roots: Vec<PathBuf>, hide_progress: bool) -> Result<()> {
    let mut session = Session::open(config).context("Failed to open dedup store")?;

    let progress = progress_for(None, hide_progress);
    let outcome = session.rebuild(roots, |p| progress.update(p));
    let report = match outcome {
        Ok(report) => {
            progress.finish();
            report
        }
        Err(e) => {
            progress.finish_with_error("rebuild failed");
            return Err(e).context("Rebuild failed");
        }
    };

    print_header("REBUILD COMPLETE");
    print_success(&format!("Files hashed:     {}", report.pipeline.records));
    print_info(&format!("Unique content:   {}", report.unique));
    print_info(&format!("Not in previous:  {}", report.not_in_previous));
    print_info(&format!(
        "Duplicates:       {} sighting(s), {} hash(es)",
        report.duplicate_sightings,
        report.duplicates.len()
    ));
    if report.pipeline.failed > 0 || report.pipeline.walk_errors > 0 {
        print_warning(&format!(
            "Unreadable: {}, walk errors: {}",
            report.pipeline.failed, report.pipeline.walk_errors
        ));
    }
    if report.snapshots_written {
        print_info(&format!("Snapshot: {}", report.snapshots.timestamped.display()));
        print_info(&format!("Duplicates: {}", report.snapshots.duplicates.display()));
        print_info(&format!(
            "Not in previous: {}",
            report.snapshots.not_in_previous.display()
        ));
    } else {
        print_warning("Snapshots could not be written, see log");
    }

    Ok(())
}

/// Write the commented configuration template
pub fn generate_config_file(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(output, Config::generate_default_config())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Configuration file: {}", output.display());
    info!("Edit this file, then pass it with --config.");

    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config, path: &Path) {
    info!("Configuration file: {}", path.display());
    info!("");
    info!("store_file = \"{}\"", config.store_file.display());
    if let Some(target) = &config.save_config_to {
        info!("save_config_to = \"{}\"", target.display());
    }
    info!("images = \"{}\"", config.images.display());
    info!("audio = \"{}\"", config.audio.display());
    info!("videos = \"{}\"", config.videos.display());
    info!("unknown = \"{}\"", config.unknown.display());
    info!("");
    info!("[categories]");
    info!("  image = {:?}", config.categories.image);
    info!("  audio = {:?}", config.categories.audio);
    info!("  video = {:?}", config.categories.video);
    info!("");
    info!("[pipeline]");
    match config.pipeline.workers {
        Some(n) => info!("  workers = {}", n),
        None => info!("  workers = (all cores)"),
    }
    info!("");
    info!("[rebuild]");
    let roots: Vec<String> = config
        .rebuild_roots()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    info!("  roots = {:?}", roots);
    info!("  keep_snapshots = {}", config.rebuild.keep_snapshots);
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
}
