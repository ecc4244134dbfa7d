use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { code_length: default_code_length() }
    }
}

/// Bounds for `verification.code_length`.
pub const CODE_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 4..=64;

fn default_max_connections() -> u32 { 5 }

fn default_busy_timeout_ms() -> u64 { 5_000 }

fn default_code_length() -> usize { 8 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ADLINK__DATABASE__URL=sqlite://prod.db`
            .add_source(config::Environment::with_prefix("ADLINK").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let length = self.verification.code_length;
        if !CODE_LENGTH_RANGE.contains(&length) {
            return Err(config::ConfigError::Message(format!(
                "verification.code_length must be between {} and {}, got {}",
                CODE_LENGTH_RANGE.start(),
                CODE_LENGTH_RANGE.end(),
                length
            )));
        }
        if self.database.max_connections == 0 {
            return Err(config::ConfigError::Message(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
