use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use discogs_collection_cache::config::{AppConfig, CliConfig, FileConfig};
use discogs_collection_cache::{
    run_server, CollectionService, DiscogsClient, FileJsonStore, JobTracker, PreloadLocks,
    RequestsLoggingLevel, ServerConfig, StaticCredentialProvider, SyncEngine,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory where cached collection pages are stored.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the Discogs API.
    #[clap(long)]
    pub discogs_base_url: Option<String>,

    /// Personal access token used for authenticated collection requests.
    #[clap(long, env = "DISCOGS_TOKEN", hide_env_values = true)]
    pub discogs_token: Option<String>,

    /// User-Agent sent to the Discogs API.
    #[clap(long)]
    pub user_agent: Option<String>,

    /// Timeout in seconds for each Discogs request.
    #[clap(long, default_value_t = 30)]
    pub request_timeout_sec: u64,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            data_dir: args.data_dir.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            discogs_base_url: args.discogs_base_url.clone(),
            discogs_token: args.discogs_token.clone(),
            user_agent: args.user_agent.clone(),
            request_timeout_sec: args.request_timeout_sec,
        }
    }
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
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Using data directory {:?}", config.data_dir);
    let store = Arc::new(FileJsonStore::new(&config.data_dir));

    if config.discogs.token.is_none() {
        info!("No Discogs token configured, authenticated requests will fall back to anonymous");
    }
    let credentials = Arc::new(StaticCredentialProvider::new(config.discogs.token.clone()));
    let client = DiscogsClient::new(
        &config.discogs.base_url,
        &config.discogs.user_agent,
        config.discogs.request_timeout_sec,
        credentials,
    )
    .context("Failed to create Discogs client")?;
    info!("Discogs API at {}", client.base_url());

    let engine = Arc::new(SyncEngine::new(
        store,
        Arc::new(client),
        Arc::new(PreloadLocks::new()),
        config.sync.clone(),
    ));
    let jobs = Arc::new(JobTracker::new(config.sync.job_retention));
    let service = CollectionService::new(engine, jobs);

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, service).await
}
