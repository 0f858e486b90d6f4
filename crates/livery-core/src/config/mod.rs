use std::time::Duration;

use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Tuning for orchestrated operations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Total attempts for an operation whose transaction fails transiently.
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Deadline for a single attempt; an expired attempt is rolled back.
    pub operation_timeout_ms: u64,
    /// How long a transaction waits on event or resource locks.
    pub lock_timeout_ms: u64,
    pub clone_title_suffix: String,
}

impl EngineConfig {
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 25,
            operation_timeout_ms: 10_000,
            lock_timeout_ms: 2_000,
            clone_title_suffix: " (Clone)".to_string(),
        }
    }
}

impl Settings {
    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let engine = EngineConfig::default();
        Ok(Config::builder()
            .set_default("database.backend", "memory")?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "info")?
            .set_default("engine.max_attempts", engine.max_attempts)?
            .set_default("engine.retry_backoff_ms", engine.retry_backoff_ms)?
            .set_default("engine.operation_timeout_ms", engine.operation_timeout_ms)?
            .set_default("engine.lock_timeout_ms", engine.lock_timeout_ms)?
            .set_default("engine.clone_title_suffix", engine.clone_title_suffix)?)
    }

    /// ## Summary
    /// Loads configuration from `config.toml` and `LIVERY_`-prefixed environment variables.
    /// Environment variables take precedence over file values; nested keys use `__`,
    /// e.g. `LIVERY_DATABASE__URL`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        let settings = Self::defaults()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env vars
            .add_source(
                config::Environment::with_prefix("LIVERY")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Builds settings from an in-memory TOML document layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Self::defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            anyhow::bail!("database.url is required for the postgres backend");
        }
        if self.engine.max_attempts == 0 {
            anyhow::bail!("engine.max_attempts must be at least 1");
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    Settings::load()
}
