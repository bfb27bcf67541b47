use crate::media::SocialSignalRule;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub artifacts_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub retrain_command: Option<Vec<String>>,

    // Feature configs
    pub media: Option<MediaConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MediaConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_sec: Option<u64>,
    pub cache_capacity: Option<u64>,
    /// Replaces the built-in rules when present.
    pub social_signals: Option<Vec<SocialSignalRule>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
