use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKWORM_ENV";
const CONFIG_DIR_ENV: &str = "BOOKWORM_CONFIG_DIR";

/// Largest page the Google Books volumes endpoint will serve.
pub const MAX_CATALOG_PAGE_SIZE: u32 = 40;

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay and
    /// `BOOKWORM_*` variables (`BOOKWORM_CATALOG__API_KEY` sets `catalog.api_key`).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("BOOKWORM")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selector variable wins over anything a file says.
        settings.environment = environment.parse()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject values the rest of the application cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let page_size = self.catalog.page_size;
        if page_size == 0 || page_size > MAX_CATALOG_PAGE_SIZE {
            bail!(
                "catalog.page_size must be between 1 and {}, got {}",
                MAX_CATALOG_PAGE_SIZE,
                page_size
            );
        }
        if self.catalog.base_url.trim().is_empty() {
            bail!("catalog.base_url must not be empty");
        }
        if self.catalog.max_sessions == 0 {
            bail!("catalog.max_sessions must be at least 1");
        }
        if self.storage.backend == StorageBackend::File && self.storage.path.trim().is_empty() {
            bail!("storage.path must not be empty for the file backend");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Where library entries are persisted.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "StorageSettings::default_path")]
    pub path: String,
}

impl StorageSettings {
    fn default_path() -> String {
        "data/library".to_string()
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "CatalogSettings::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "CatalogSettings::default_page_size")]
    pub page_size: u32,
    #[serde(default = "CatalogSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Search sessions untouched for this long are dropped.
    #[serde(default = "CatalogSettings::default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,
    /// Opening a session beyond this count drops the least recently used one.
    #[serde(default = "CatalogSettings::default_max_sessions")]
    pub max_sessions: usize,
}

impl CatalogSettings {
    fn default_base_url() -> String {
        "https://www.googleapis.com/books/v1".to_string()
    }

    fn default_page_size() -> u32 {
        20
    }

    fn default_request_timeout_ms() -> u64 {
        10000
    }

    fn default_session_idle_ttl_secs() -> u64 {
        1800
    }

    fn default_max_sessions() -> usize {
        1000
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            page_size: Self::default_page_size(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            session_idle_ttl_secs: Self::default_session_idle_ttl_secs(),
            max_sessions: Self::default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive, e.g. `"info,bookworm_app=debug"`. Falls back to `RUST_LOG`.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
