use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use super::interpolation::{
    interpolate_toml,
    InterpolationError,
};
use super::schema::RunnerConfig;

pub const CONFIG_ENV_VAR: &str = "TESTLINK_RUNNER_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "testlink-runner.toml";

/// Tables interpolated from the process environment when the file is
/// loaded. `[job]` is expanded later against the build environment.
const INTERPOLATED_TABLES: &[&str] = &["general", "installations"];

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Environment variable interpolation failed: {0}")]
    InterpolationError(#[from] InterpolationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ConfigLoadResult<T> = Result<T, ConfigLoadError>;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn discover_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            tracing::debug!("Using config path from {}: {}", CONFIG_ENV_VAR, path);
            return PathBuf::from(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            tracing::debug!("Using local config path: {}", local.display());
            return local;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("testlink-runner").join("config.toml");
            if path.exists() {
                tracing::debug!("Using user config path: {}", path.display());
                return path;
            }
        }

        tracing::debug!("No config found, falling back to {}", local.display());
        local
    }

    pub fn load(path: &Path) -> ConfigLoadResult<RunnerConfig> {
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigLoadResult<RunnerConfig> {
        let mut table: toml::Table = toml::from_str(content)?;

        for name in INTERPOLATED_TABLES {
            if let Some(value) = table.get_mut(*name) {
                interpolate_toml(value)?;
            }
        }

        let config: RunnerConfig = toml::Value::Table(table).try_into().map_err(|e| {
            ConfigLoadError::InvalidConfig(format!("Failed to deserialize config: {}", e))
        })?;

        tracing::debug!(
            installations = config.installations.len(),
            seekers = config.job.result_seekers.len(),
            "Loaded config"
        );

        Ok(config)
    }

    pub fn to_toml(config: &RunnerConfig) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(config)
    }
}
