// src/config.rs
//! Service configuration: TOML file plus env overrides.
//!
//! Resolution:
//! 1) $SELENITE_CONFIG_PATH (must exist if set)
//! 2) config/selenite.toml (optional; defaults when missing)
//!
//! Then `SELENITE_STORE_PATH` / `SELENITE_REFRESH_SECS` override the file values.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/selenite.toml";
pub const DEFAULT_STORE_PATH: &str = "config/accounts.json";
pub const DEFAULT_REFRESH_SECS: u64 = 300;

pub const ENV_CONFIG_PATH: &str = "SELENITE_CONFIG_PATH";
pub const ENV_STORE_PATH: &str = "SELENITE_STORE_PATH";
pub const ENV_REFRESH_SECS: &str = "SELENITE_REFRESH_SECS";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Account record file (`.json` or `.toml`).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            refresh_interval_secs: default_refresh_secs(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

// parse a positive integer env value; anything else is ignored
fn parse_secs_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

impl AppConfig {
    /// Load using env var + fallbacks, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            Self::from_path(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::from_path(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing config at {}", path.display()))
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(toml_str)?;
        if cfg.store.refresh_interval_secs == 0 {
            cfg.store.refresh_interval_secs = DEFAULT_REFRESH_SECS;
        }
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(p) = std::env::var(ENV_STORE_PATH) {
            if !p.trim().is_empty() {
                self.store.path = PathBuf::from(p.trim());
            }
        }
        if let Some(secs) = parse_secs_env(std::env::var(ENV_REFRESH_SECS).ok()) {
            self.store.refresh_interval_secs = secs;
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.store.refresh_interval_secs)
    }
}
