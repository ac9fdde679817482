use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;

/// Waits for a HAR analysis job and prints its results as they become available.
#[derive(Debug, Parser)]
#[command(name = "har-results", version)]
pub struct Cli {
    /// Job id returned by the upload endpoint.
    #[arg(long = "job")]
    pub job_id: String,

    /// Persona to request results for (developer, qa, salesEngineer, ...).
    #[arg(long)]
    pub persona: Option<String>,

    /// Backend root URL.
    #[arg(long, env = "HAR_RESULTS_API_URL")]
    pub api_url: Option<String>,

    /// RON configuration file; missing files are ignored.
    #[arg(long, default_value = "har-results.ron")]
    pub config: PathBuf,

    /// Directory for cached results; overrides the configuration file.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Keep results in memory only; nothing is read from or written to disk.
    #[arg(long, conflicts_with = "cache_dir")]
    pub no_cache: bool,

    /// Write a JSON report into this directory once results arrive.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
            LogTarget::Both => LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
