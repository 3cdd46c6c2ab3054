use serde::Deserialize;

use crate::downsample::NATIVE_SAMPLE_SPACING_SECS;
use crate::models::DEFAULT_PER_PAGE;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Nominal host-metric sampling interval; the downsampling stride is derived from it.
    #[serde(default = "default_native_sample_spacing_secs")]
    pub native_sample_spacing_secs: u32,
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,
    /// Upper bound for a client-supplied per_page.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
    /// Largest bucket sequence a history request may produce.
    #[serde(default = "default_max_buckets")]
    pub max_buckets: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            native_sample_spacing_secs: default_native_sample_spacing_secs(),
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            max_buckets: default_max_buckets(),
        }
    }
}

fn default_native_sample_spacing_secs() -> u32 {
    NATIVE_SAMPLE_SPACING_SECS
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_max_per_page() -> u32 {
    1000
}

fn default_max_buckets() -> u32 {
    10_000
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.history.native_sample_spacing_secs > 0,
            "history.native_sample_spacing_secs must be > 0, got {}",
            self.history.native_sample_spacing_secs
        );
        anyhow::ensure!(
            self.history.default_per_page > 0,
            "history.default_per_page must be > 0, got {}",
            self.history.default_per_page
        );
        anyhow::ensure!(
            self.history.max_per_page >= self.history.default_per_page,
            "history.max_per_page ({}) must be >= history.default_per_page ({})",
            self.history.max_per_page,
            self.history.default_per_page
        );
        anyhow::ensure!(
            self.history.max_buckets > 0,
            "history.max_buckets must be > 0, got {}",
            self.history.max_buckets
        );
        Ok(())
    }
}
