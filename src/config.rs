use std::{env, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "change-me-mine-report-development-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Mongo,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage: StorageKind,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl_seconds: u64,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            storage: StorageKind::Mongo,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "mine_report".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_issuer: "mine-report".to_string(),
            jwt_audience: "mine-report-clients".to_string(),
            token_ttl_seconds: 86400,
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self, ConfigError> {
        let path =
            env::var("MINE_REPORT_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            let content = fs::read_to_string(&path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
            Self::from_toml(&content)?
        } else {
            warn!(%path, "config file not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(uri) = env::var("MONGODB_URI") {
            self.mongodb_uri = uri;
        }
        if let Ok(database) = env::var("MONGODB_DATABASE") {
            self.mongodb_database = database;
        }
        if let Ok(bind_addr) = env::var("BIND_ADDR") {
            self.bind_addr = bind_addr;
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Ok(storage) = env::var("STORAGE") {
            match storage.trim().to_lowercase().as_str() {
                "memory" => self.storage = StorageKind::Memory,
                "mongo" => self.storage = StorageKind::Mongo,
                other => warn!(storage = other, "unknown STORAGE value ignored"),
            }
        }
    }

    pub fn normalize(&mut self) {
        self.bind_addr = self.bind_addr.trim().to_string();
        self.mongodb_database = self.mongodb_database.trim().to_string();
        if self.default_page_size == 0 {
            self.default_page_size = AppConfig::default().default_page_size;
        }
        if self.max_page_size < self.default_page_size {
            self.max_page_size = self.default_page_size;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.is_empty() {
            return Err(ConfigError::Invalid("bind_addr is empty".to_string()));
        }
        if self.storage == StorageKind::Mongo && self.mongodb_database.is_empty() {
            return Err(ConfigError::Invalid("mongodb_database is empty".to_string()));
        }
        if self.jwt_secret.len() < 16 {
            return Err(ConfigError::Invalid(
                "jwt_secret must be at least 16 bytes".to_string(),
            ));
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("jwt_secret is the development default, set JWT_SECRET in production");
        }
        if self.token_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("token_ttl_seconds must be positive".to_string()));
        }
        Ok(())
    }

    /// Clamps a requested page size to the configured bounds.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(0) | None => self.default_page_size,
            Some(limit) => limit.min(self.max_page_size),
        }
    }
}
