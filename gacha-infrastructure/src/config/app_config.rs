use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use gacha_domain::RuntimeConfig;

use crate::config::{validate_data_dir, validate_lang};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub data_dir: String,
    pub catalog_path: Option<String>,
    pub pools_path: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub export_app: String,
    pub lang: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            api_token: None,
            data_dir: runtime.data_dir,
            catalog_path: None,
            pools_path: None,
            max_body_bytes: runtime.max_body_bytes,
            request_timeout_seconds: runtime.request_timeout_seconds,
            export_app: runtime.export_app,
            lang: runtime.lang,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("GACHA_LEDGER_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(Path::new(&path)).await
    }

    pub async fn load_from(file_path: &Path) -> Result<Self> {
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str(&content)?
        } else {
            warn!("{} not found, using defaults", file_path.display());
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.catalog_path = non_blank(self.catalog_path.take());
        self.pools_path = non_blank(self.pools_path.take());
        self.lang = self.lang.trim().to_lowercase();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.data_dir = resolve_path(base, &self.data_dir);
        self.catalog_path = self.catalog_path.as_deref().map(|path| resolve_path(base, path));
        self.pools_path = self.pools_path.as_deref().map(|path| resolve_path(base, path));
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        validate_data_dir(&self.data_dir)?;
        validate_lang(&self.lang)?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            data_dir: self.data_dir.clone(),
            catalog_path: self.catalog_path.clone(),
            pools_path: self.pools_path.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            export_app: self.export_app.clone(),
            lang: self.lang.clone(),
            ..RuntimeConfig::default()
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("GACHA_LEDGER_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("GACHA_LEDGER_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("GACHA_LEDGER_DATA_DIR") {
            self.data_dir = value;
        }
        if let Ok(value) = env::var("GACHA_LEDGER_CATALOG_PATH") {
            self.catalog_path = Some(value);
        }
        if let Ok(value) = env::var("GACHA_LEDGER_POOLS_PATH") {
            self.pools_path = Some(value);
        }
        if let Ok(value) = env::var("GACHA_LEDGER_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("GACHA_LEDGER_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("GACHA_LEDGER_EXPORT_APP") {
            self.export_app = value;
        }
        if let Ok(value) = env::var("GACHA_LEDGER_LANG") {
            self.lang = value;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
