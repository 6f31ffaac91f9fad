//! Client configuration
//!
//! ## Resolution
//!
//! 1. Built-in defaults
//! 2. Override file in the data dir (~/.local/share/fintrack/config.toml)
//! 3. Environment variables (`FINTRACK_API_BASE`, `FINTRACK_TIMEOUT_SECS`)
//!
//! The data dir itself comes from the caller, then `FINTRACK_DATA_DIR`,
//! then the platform default.
//!
//! ```toml
//! api_base = "https://finance.example.com"
//! timeout_secs = 20
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const API_BASE_ENV: &str = "FINTRACK_API_BASE";
pub const TIMEOUT_ENV: &str = "FINTRACK_TIMEOUT_SECS";
pub const DATA_DIR_ENV: &str = "FINTRACK_DATA_DIR";

const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the finance service, without trailing slash
    pub api_base: String,
    /// Per-request timeout applied by the HTTP gateway
    pub timeout: Duration,
    /// Where the session slot and config file live
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: default_data_dir(),
        }
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    api_base: Option<String>,
    timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Load from the process environment and the config file in the data dir
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        Self::load_with(data_dir, |key| std::env::var(key).ok())
    }

    /// Load with an explicit variable lookup (tests pass a map here)
    pub fn load_with<F>(data_dir: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = data_dir
            .or_else(|| lookup(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let mut config = Self {
            data_dir,
            ..Self::default()
        };

        let path = config.config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
            config.apply_toml(&content)?;
        }

        if let Some(base) = lookup(API_BASE_ENV) {
            config.api_base = normalize_base(&base);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} must be a number of seconds", TIMEOUT_ENV)))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = normalize_base(base);
        self
    }

    fn apply_toml(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        if let Some(base) = raw.api_base {
            self.api_base = normalize_base(&base);
        }
        if let Some(secs) = raw.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        Ok(())
    }
}

/// Default data directory (~/.local/share/fintrack on Linux)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("fintrack"))
        .unwrap_or_else(|| Path::new(".fintrack").to_path_buf())
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
