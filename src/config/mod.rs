mod file_config;

pub use file_config::{FileConfig, MediaConfig};

use crate::media::{tmdb::DEFAULT_BASE_URL, SocialSignalRules, DEFAULT_CAPACITY};
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub artifacts_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub tmdb_api_key: Option<String>,
    pub tmdb_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub artifacts_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub retrain_command: Option<Vec<String>>,

    // Feature configs (with defaults)
    pub media: MediaSettings,
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
    /// Without a key the media collaborator is disabled.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_sec: u64,
    pub cache_capacity: u64,
    pub social_signals: SocialSignalRules,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_sec: 5,
            cache_capacity: DEFAULT_CAPACITY,
            social_signals: SocialSignalRules::default(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let artifacts_dir = file
            .artifacts_dir
            .map(PathBuf::from)
            .or_else(|| cli.artifacts_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "artifacts_dir must be specified via --artifacts-dir or in config file"
                )
            })?;

        if !artifacts_dir.exists() {
            bail!("Artifacts directory does not exist: {:?}", artifacts_dir);
        }
        if !artifacts_dir.is_dir() {
            bail!("artifacts_dir is not a directory: {:?}", artifacts_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let retrain_command = file.retrain_command.filter(|argv| !argv.is_empty());

        let media_file = file.media.unwrap_or_default();
        let defaults = MediaSettings::default();
        let media = MediaSettings {
            api_key: media_file
                .api_key
                .or_else(|| cli.tmdb_api_key.clone())
                .filter(|key| !key.is_empty()),
            base_url: media_file.base_url.unwrap_or(defaults.base_url),
            timeout_sec: media_file.timeout_sec.unwrap_or(cli.tmdb_timeout_sec),
            cache_capacity: media_file.cache_capacity.unwrap_or(defaults.cache_capacity),
            social_signals: media_file
                .social_signals
                .map(SocialSignalRules::new)
                .unwrap_or(defaults.social_signals),
        };

        Ok(Self {
            artifacts_dir,
            port,
            metrics_port,
            logging_level,
            retrain_command,
            media,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            retrain_command: self.retrain_command.clone(),
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
