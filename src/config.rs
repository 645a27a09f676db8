//! Application configuration management.
//!
//! Configuration is stored at `~/.config/waybill/config.json` and can be
//! overridden per-run through the environment:
//!
//! - `WAYBILL_API_URL`: REST backend base URL
//! - `WAYBILL_IMGBB_KEY`: imgbb upload API key
//! - `WAYBILL_LOCAL_STORE`: "1"/"true" to run against local JSON files
//!   instead of the network

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "waybill";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub imgbb_api_key: Option<String>,
    /// When set, the data service runs entirely against local JSON files.
    #[serde(default)]
    pub use_local_store: bool,
    #[serde(default)]
    pub local_store_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            imgbb_api_key: None,
            use_local_store: false,
            local_store_dir: None,
        }
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("WAYBILL_API_URL") {
            if !url.is_empty() {
                self.api_base_url = url;
            }
        }
        if let Ok(key) = std::env::var("WAYBILL_IMGBB_KEY") {
            if !key.is_empty() {
                self.imgbb_api_key = Some(key);
            }
        }
        if let Ok(flag) = std::env::var("WAYBILL_LOCAL_STORE") {
            self.use_local_store = matches!(flag.as_str(), "1" | "true" | "yes");
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory the local store keeps its JSON files in.
    pub fn local_store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.local_store_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
