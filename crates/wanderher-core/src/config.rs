use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::mistral::DEFAULT_BASE_URL;

pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";
pub const RELAY_URL_ENV: &str = "WANDERHER_RELAY_URL";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub mistral_api_key: Option<String>,
    pub mistral_base_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub relay_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user config directory; a missing file gives defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("wanderher"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Provider API key: environment first, then the config file. An absent
    /// key is not an error here; the provider rejects the call later.
    pub fn api_key(&self) -> String {
        self.api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with(&self, env: Option<String>) -> String {
        env.filter(|key| !key.is_empty())
            .or_else(|| self.mistral_api_key.clone())
            .unwrap_or_default()
    }

    pub fn base_url(&self) -> String {
        self.mistral_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn bind_address(&self) -> String {
        format!(
            "{}:{}",
            self.host.as_deref().unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT)
        )
    }

    /// Where the terminal client sends chat requests.
    pub fn relay_url(&self) -> String {
        self.relay_url_with(std::env::var(RELAY_URL_ENV).ok())
    }

    fn relay_url_with(&self, env: Option<String>) -> String {
        env.filter(|url| !url.is_empty())
            .or_else(|| self.relay_url.clone())
            .unwrap_or_else(|| format!("http://{}", self.bind_address()))
    }
}
