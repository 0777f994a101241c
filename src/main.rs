//! Taproot CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "taproot")]
#[command(about = "Incremental module dependency map for test watch runs", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build (or incrementally refresh) the dependency map and persist it
    Index {
        /// Entry test files, absolute or relative to the working directory
        #[arg(required = true)]
        entries: Vec<PathBuf>,

        /// Directory holding the persisted caches
        #[arg(long, default_value = ".taproot")]
        cache_dir: PathBuf,

        /// Destroy the persisted caches before loading
        #[arg(long)]
        reset: bool,

        /// Glob patterns to exclude from dependency discovery
        #[arg(long = "ignore")]
        ignored: Vec<String>,

        /// Working directory anchoring relative paths
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Print the entry files affected by changed files
    Affected {
        /// Entry test files, absolute or relative to the working directory
        #[arg(required = true)]
        entries: Vec<PathBuf>,

        /// Directory holding the persisted caches
        #[arg(long, default_value = ".taproot")]
        cache_dir: PathBuf,

        /// Changed files; when omitted, the files that changed on disk
        /// since the last invocation are used
        #[arg(long = "changed")]
        changed: Vec<PathBuf>,

        /// Files to force-mark as changed
        #[arg(long = "mark-changed")]
        mark_changed: Vec<PathBuf>,

        /// Glob patterns to exclude from dependency discovery
        #[arg(long = "ignore")]
        ignored: Vec<String>,

        /// Working directory anchoring relative paths
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Remove the persisted caches
    Clear {
        /// Directory holding the persisted caches
        #[arg(long, default_value = ".taproot")]
        cache_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "taproot={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Index {
            entries,
            cache_dir,
            reset,
            ignored,
            cwd,
        } => commands::index(entries, cache_dir, reset, ignored, cwd),
        Command::Affected {
            entries,
            cache_dir,
            changed,
            mark_changed,
            ignored,
            cwd,
        } => commands::affected(entries, cache_dir, changed, mark_changed, ignored, cwd),
        Command::Clear { cache_dir } => commands::clear(cache_dir),
    }
}
