use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub data_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,

    // Feature configs
    pub discogs: Option<DiscogsConfig>,
    pub sync: Option<SyncConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DiscogsConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub user_agent: Option<String>,
    pub request_timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub cache_ttl_hours: Option<u64>,
    pub preload_warm_hours: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub max_scan_pages: Option<u32>,
    pub per_page: Option<u32>,
    pub orphan_probe_pages: Option<u32>,
    pub job_retention_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
