mod file_config;

pub use file_config::{DiscogsConfig, FileConfig, SyncConfig};

use crate::discogs::DEFAULT_DISCOGS_API_BASE;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "DiscogsCollectionCache/0.1";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub discogs_base_url: Option<String>,
    pub discogs_token: Option<String>,
    pub user_agent: Option<String>,
    pub request_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub data_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,

    // Remote catalog
    pub discogs: DiscogsSettings,

    // Sync engine tuning (with defaults)
    pub sync: SyncSettings,
}

#[derive(Debug, Clone)]
pub struct DiscogsSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub request_timeout_sec: u64,
}

/// Tuning knobs of the sync engine.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Cached pages younger than this are served without contacting the remote.
    pub cache_ttl: Duration,
    /// A completed preload younger than this is not repeated.
    pub preload_warm_window: Duration,
    /// Delay slept before each remote call issued by preload and scans.
    pub request_delay: Duration,
    /// Upper bound of remote pages visited by an incremental scan.
    pub max_scan_pages: u32,
    /// Page size used for fetching and for re-paginating the cache.
    pub per_page: u32,
    /// How many page numbers past the last page are probed for orphans.
    pub orphan_probe_pages: u32,
    /// How long finished jobs stay visible in the job tracker.
    pub job_retention: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            preload_warm_window: Duration::from_secs(12 * 60 * 60),
            request_delay: Duration::from_millis(1000),
            max_scan_pages: 10,
            per_page: 50,
            orphan_probe_pages: 5,
            job_retention: Duration::from_secs(5 * 60),
        }
    }
}

impl SyncSettings {
    fn from_file(file: SyncConfig) -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            cache_ttl: hours_setting("sync.cache_ttl_hours", file.cache_ttl_hours)?
                .unwrap_or(defaults.cache_ttl),
            preload_warm_window: hours_setting("sync.preload_warm_hours", file.preload_warm_hours)?
                .unwrap_or(defaults.preload_warm_window),
            request_delay: file
                .request_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_delay),
            max_scan_pages: file.max_scan_pages.unwrap_or(defaults.max_scan_pages),
            per_page: file.per_page.unwrap_or(defaults.per_page),
            orphan_probe_pages: file
                .orphan_probe_pages
                .unwrap_or(defaults.orphan_probe_pages),
            job_retention: file
                .job_retention_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_retention),
        };

        if settings.per_page == 0 {
            bail!("sync.per_page must be greater than 0");
        }
        if settings.max_scan_pages == 0 {
            bail!("sync.max_scan_pages must be greater than 0");
        }
        Ok(settings)
    }
}

fn hours_setting(name: &str, hours: Option<u64>) -> Result<Option<Duration>> {
    match hours {
        None => Ok(None),
        Some(h) => match h.checked_mul(60 * 60) {
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => bail!("{} is too large: {}", name, h),
        },
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let discogs_file = file.discogs.unwrap_or_default();
        let discogs = DiscogsSettings {
            base_url: discogs_file
                .base_url
                .or_else(|| cli.discogs_base_url.clone())
                .unwrap_or_else(|| DEFAULT_DISCOGS_API_BASE.to_string()),
            token: discogs_file.token.or_else(|| cli.discogs_token.clone()),
            user_agent: discogs_file
                .user_agent
                .or_else(|| cli.user_agent.clone())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            request_timeout_sec: discogs_file
                .request_timeout_sec
                .unwrap_or(cli.request_timeout_sec),
        };

        let sync = SyncSettings::from_file(file.sync.unwrap_or_default())?;

        Ok(Self {
            data_dir,
            port,
            logging_level,
            discogs,
            sync,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
