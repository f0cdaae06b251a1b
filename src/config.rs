use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::models::{DEFAULT_COUNT, MAX_COUNT};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".manga-recommender";
/// Largest page count the refresh endpoint accepts.
const MAX_REFRESH_PAGES: u32 = 50;

/// Client configuration loaded from `MANGA_`-prefixed environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the recommendation service.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Result count used when the search form's count field is blank.
    #[serde(default = "default_count")]
    pub default_count: u32,

    /// Pages requested from the data-refresh endpoint.
    #[serde(default = "default_refresh_pages")]
    pub refresh_pages: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where the preferences database lives. Defaults to `~/.manga-recommender`.
    pub data_dir: Option<PathBuf>,

    /// Where log files are written. Defaults to `<data_dir>/logs`.
    pub log_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_count() -> u32 {
    DEFAULT_COUNT
}

fn default_refresh_pages() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            default_count: default_count(),
            refresh_pages: default_refresh_pages(),
            request_timeout_secs: default_request_timeout_secs(),
            data_dir: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::prefixed("MANGA_")
            .from_env::<Config>()
            .map_err(|e| anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_COUNT).contains(&self.default_count) {
            bail!("MANGA_DEFAULT_COUNT must be between 1 and {MAX_COUNT}");
        }
        if !(1..=MAX_REFRESH_PAGES).contains(&self.refresh_pages) {
            bail!("MANGA_REFRESH_PAGES must be between 1 and {MAX_REFRESH_PAGES}");
        }
        if self.api_url.trim().is_empty() {
            bail!("MANGA_API_URL must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the data directory, falling back to a folder in the user's home.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.data_dir()?.join("logs")),
        }
    }
}
