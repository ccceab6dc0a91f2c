use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to do when the remote size no longer matches the partial file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeChangePolicy {
    /// Fail the transfer and keep the partial file untouched.
    #[default]
    Fail,
    /// Truncate the partial file and download from offset 0.
    Restart,
}

/// Global configuration loaded from `~/.config/rdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdlConfig {
    /// Connect timeout for probe and fetch, in seconds. Covers connection setup only.
    pub connect_timeout_secs: u64,
    /// Maximum redirects followed by probe and fetch.
    pub max_redirections: u32,
    /// Receive buffer size in bytes; bounds the chunk size and so pause/cancel latency.
    #[serde(default)]
    pub buffer_bytes: Option<usize>,
    /// Abort a fetch whose throughput stays below this many bytes/sec for
    /// `low_speed_time_secs`. Unset means a stalled read blocks indefinitely.
    #[serde(default)]
    pub low_speed_limit: Option<u32>,
    #[serde(default)]
    pub low_speed_time_secs: Option<u64>,
    /// Policy when a resumed transfer finds a different remote size.
    #[serde(default)]
    pub on_size_change: SizeChangePolicy,
    /// Restart from zero when the server answers a ranged GET with a full 200 body.
    #[serde(default)]
    pub restart_without_ranges: bool,
    /// Default directory for `rdl get` when no output path is given.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl Default for RdlConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            max_redirections: 10,
            buffer_bytes: None,
            low_speed_limit: None,
            low_speed_time_secs: None,
            on_size_change: SizeChangePolicy::Fail,
            restart_without_ranges: false,
            download_dir: None,
        }
    }
}

/// libcurl settings shared by the probe and the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    pub max_redirections: u32,
    pub buffer_size: Option<usize>,
    /// `(bytes_per_sec, window)` low-speed abort.
    pub low_speed: Option<(u32, Duration)>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        CurlOptions::from(&RdlConfig::default())
    }
}

impl From<&RdlConfig> for CurlOptions {
    fn from(cfg: &RdlConfig) -> Self {
        let low_speed = match (cfg.low_speed_limit, cfg.low_speed_time_secs) {
            (Some(limit), Some(secs)) if limit > 0 && secs > 0 => {
                Some((limit, Duration::from_secs(secs)))
            }
            _ => None,
        };
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            max_redirections: cfg.max_redirections,
            buffer_size: cfg.buffer_bytes,
            low_speed,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RdlConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<RdlConfig> {
    if !path.exists() {
        let default_cfg = RdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("failed to write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: RdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
