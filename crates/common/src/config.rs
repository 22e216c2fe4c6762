//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Moderation configuration.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Moderation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Age after which an unresolved claim is reported as stale.
    #[serde(default = "default_stale_claim_after_hours")]
    pub stale_claim_after_hours: u64,
    /// Interval between maintenance passes in the worker.
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            stale_claim_after_hours: default_stale_claim_after_hours(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
        }
    }
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_stale_claim_after_hours() -> u64 {
    72
}

const fn default_maintenance_interval_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `TRUSTMOD_ENV`)
    /// 3. Environment variables with `TRUSTMOD_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("TRUSTMOD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TRUSTMOD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TRUSTMOD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Stale-claim cut-off as a chrono duration.
    #[must_use]
    pub fn stale_claim_after(&self) -> chrono::Duration {
        chrono::Duration::hours(self.moderation.stale_claim_after_hours as i64)
    }
}
