use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::kv::FileStore;
use crate::sync::{AuthProvider, DisabledAuth, HttpRemoteLibrary, RemoteLibrary, TokenAuth};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the file-backed store. Defaults to the platform data dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prmpt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote deployment URL. Cloud sync is unconfigured without it.
    #[serde(default)]
    pub url: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: None,
            token_env: default_token_env(),
            user_id: None,
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_token_env() -> String {
    "PRMPT_SYNC_TOKEN".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        // If explicit path provided, use it
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path)
                .with_context(|| format!("failed to load config from {}", config_path));
        }

        if let Ok(config) = Self::load_from_path("prmpt.toml") {
            debug!("Loaded config from ./prmpt.toml");
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("prmpt").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::open(self.storage.resolved_dir())
    }

    /// Token-backed auth when sync is configured and the token is present,
    /// otherwise the no-op provider.
    pub fn auth_provider(&self) -> Arc<dyn AuthProvider> {
        if self.sync.url.is_none() {
            return Arc::new(DisabledAuth);
        }
        match TokenAuth::from_env(&self.sync.token_env, self.sync.user_id.clone()) {
            Some(auth) => Arc::new(auth),
            None => {
                debug!(
                    "No sync token in ${}; cloud sync stays signed out",
                    self.sync.token_env
                );
                Arc::new(DisabledAuth)
            }
        }
    }

    pub fn remote(&self) -> Result<Option<Arc<dyn RemoteLibrary>>> {
        match &self.sync.url {
            Some(url) => {
                let remote = HttpRemoteLibrary::new(url, self.sync.timeout_secs)?;
                Ok(Some(Arc::new(remote)))
            }
            None => Ok(None),
        }
    }
}
