use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use boxoffice_server::artifacts::ArtifactStore;
use boxoffice_server::config;
use boxoffice_server::media::tmdb::TmdbClient;
use boxoffice_server::media::{MediaCache, MediaProvider, NoOpMediaProvider, TmdbMediaService};
use boxoffice_server::prediction::Predictor;
use boxoffice_server::server::{metrics, run_server, RequestsLoggingLevel, ServerState};

const TMDB_API_KEY_ENV: &str = "TMDB_API_KEY";

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the trained model artifacts.
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_path)]
    pub artifacts_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// TMDB API key. Falls back to the TMDB_API_KEY environment variable.
    #[clap(long)]
    pub tmdb_api_key: Option<String>,

    /// Timeout in seconds for TMDB requests.
    #[clap(long, default_value_t = 5)]
    pub tmdb_timeout_sec: u64,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            artifacts_dir: args.artifacts_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            tmdb_api_key: args
                .tmdb_api_key
                .clone()
                .or_else(|| std::env::var(TMDB_API_KEY_ENV).ok()),
            tmdb_timeout_sec: args.tmdb_timeout_sec,
        }
    }
}

fn make_media_provider(settings: &config::MediaSettings) -> Result<Arc<dyn MediaProvider>> {
    let Some(api_key) = &settings.api_key else {
        warn!("No TMDB API key configured, media signals are disabled");
        return Ok(Arc::new(NoOpMediaProvider));
    };

    info!("TMDB media service configured at {}", settings.base_url);
    let client = TmdbClient::new(&settings.base_url, api_key, settings.timeout_sec)?;
    Ok(Arc::new(TmdbMediaService::new(
        client,
        MediaCache::new(settings.cache_capacity),
        settings.social_signals.clone(),
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  artifacts_dir: {:?}", app_config.artifacts_dir);
    info!("  port: {}", app_config.port);
    info!("  metrics_port: {}", app_config.metrics_port);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let load = ArtifactStore::new(&app_config.artifacts_dir).load();
    let media = make_media_provider(&app_config.media)?;
    let predictor = Arc::new(Predictor::new(load, media.clone()));
    let state = ServerState::new(app_config.server_config(), predictor, media);

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);
    run_server(state).await
}
