use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use results_core::{EmptyPersona, JobId, Persona};
use results_engine::EngineConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

/// Cache location used when neither the command line nor the file names one.
pub const DEFAULT_CACHE_DIR: &str = ".har-results-cache";

/// Optional settings read from the RON configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub persona: Option<String>,
    pub max_retries: Option<u32>,
    pub poll_interval_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("job id must not be empty")]
    EmptyJobId,
    #[error("invalid persona: {0}")]
    Persona(#[from] EmptyPersona),
    #[error("max_retries must be at least 1")]
    NoRetries,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub job_id: JobId,
    pub persona: Persona,
    pub engine: EngineConfig,
    pub export_dir: Option<PathBuf>,
}

pub fn load_file_config(path: &Path) -> FileConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return FileConfig::default();
        }
        Err(err) => {
            engine_warn!("Failed to read configuration from {:?}: {}", path, err);
            return FileConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            engine_info!("Loaded configuration from {:?}", path);
            config
        }
        Err(err) => {
            engine_warn!("Failed to parse configuration from {:?}: {}", path, err);
            FileConfig::default()
        }
    }
}

/// Command-line flags win over the file, the file wins over defaults.
pub fn resolve(cli: &Cli, file: FileConfig) -> Result<AppConfig, ConfigError> {
    let job_id = cli.job_id.trim();
    if job_id.is_empty() {
        return Err(ConfigError::EmptyJobId);
    }

    let persona = match cli.persona.as_deref().or(file.persona.as_deref()) {
        Some(tag) => tag.parse()?,
        None => Persona::default(),
    };

    let mut engine = EngineConfig::default();
    if let Some(api_url) = cli.api_url.clone().or(file.api_url) {
        engine.fetch.base_url = api_url;
    }
    if let Some(secs) = file.connect_timeout_secs {
        engine.fetch.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.request_timeout_secs {
        engine.fetch.request_timeout = Duration::from_secs(secs);
    }
    if let Some(max_retries) = file.max_retries {
        if max_retries == 0 {
            return Err(ConfigError::NoRetries);
        }
        engine.poll.max_retries = max_retries;
    }
    if let Some(secs) = file.poll_interval_secs {
        engine.poll.poll_interval = Duration::from_secs(secs);
    }
    engine.cache_dir = if cli.no_cache {
        None
    } else {
        Some(
            cli.cache_dir
                .clone()
                .or(file.cache_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
        )
    };

    Ok(AppConfig {
        job_id: JobId::new(job_id),
        persona,
        engine,
        export_dir: cli.export.clone().or(file.export_dir),
    })
}
