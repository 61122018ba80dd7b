use crate::core::store::DEFAULT_TABLE;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub key: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            url: None,
            key: None,
            table: default_table(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed browser origin; any origin when unset.
    pub cors_origin: Option<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            cors_origin: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    /// Loads the default config file if present, then applies `.env` and
    /// process environment overrides.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!("No config file at {}, using defaults", config_path.display());
            Self::default()
        };
        dotenv::dotenv().ok();
        Ok(config.with_env(|name| std::env::var(name).ok()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "stockdata", "stockdata")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Same as [`AppConfig::load_from_path`] followed by environment overrides.
    pub fn load_with_env<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config = Self::load_from_path(path)?;
        dotenv::dotenv().ok();
        Ok(config.with_env(|name| std::env::var(name).ok()))
    }

    /// Overrides settings from variables found by `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = lookup("SUPABASE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            self.store.key = Some(key);
        }
        if let Some(table) = lookup("STOCKDATA_TABLE") {
            self.store.table = table;
        }
        if let Some(bind) = lookup("STOCKDATA_BIND") {
            self.server.bind = bind;
        }
        if let Some(base_url) = lookup("API_BASE_URL") {
            self.api.base_url = base_url;
        }
        self
    }

    /// The store URL and access key; both are required to reach the store.
    pub fn store_credentials(&self) -> Result<(&str, &str)> {
        match (self.store.url.as_deref(), self.store.key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Ok((url, key)),
            _ => anyhow::bail!("Store URL or access key is missing"),
        }
    }
}
