use std::path::PathBuf;

use results_core::PollConfig;

use crate::FetchSettings;

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub poll: PollConfig,
    /// Directory for persisted results; `None` keeps them in memory only.
    pub cache_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn default_with_api(base_url: impl Into<String>) -> Self {
        Self {
            fetch: FetchSettings {
                base_url: base_url.into(),
                ..FetchSettings::default()
            },
            ..Self::default()
        }
    }
}
