//! Configuration for the `salesboard` operator binary.
//!
//! Settings are layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (through clap's `env` attribute)
//! 3. TOML config file (`~/.config/salesboard/config.toml` or `--config`)
//! 4. Compiled defaults

use crate::pipeline::{
    adapters::RetryPolicy, board::BoardSettings, domain::ResourceName, services::ConsistencyMode,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Record store URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SalesboardConfigFile {
    log_level: Option<String>,
    gateway: GatewayFileConfig,
    retry: RetryFileConfig,
    board: BoardFileConfig,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct GatewayFileConfig {
    base_url: Option<String>,
    resource: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RetryFileConfig {
    max_attempts: Option<u32>,
    base_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    activation_distance: Option<f64>,
    move_consistency: Option<ConsistencyMode>,
}

/// Global CLI options shared by every command.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Path to config file (default: `~/.config/salesboard/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the record store.
    #[arg(long, env = "SALESBOARD_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, env = "SALESBOARD_LOG", global = true)]
    pub log_level: Option<String>,
}

/// Record store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL of the record store.
    pub base_url: String,
    /// Resource holding pipeline tasks.
    pub resource: ResourceName,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            resource: ResourceName::sales_pipeline(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesboardConfig {
    /// Log level filter string.
    pub log_level: String,
    /// Record store settings.
    pub gateway: GatewayConfig,
    /// Retry settings for gateway calls.
    pub retry: RetryPolicy,
    /// Board settings.
    pub board: BoardSettings,
}

impl Default for SalesboardConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            gateway: GatewayConfig::default(),
            retry: RetryPolicy::default(),
            board: BoardSettings::default(),
        }
    }
}

impl SalesboardConfig {
    /// Loads configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// An explicit `--config` file must exist. Without one the default path
    /// is tried and a missing file counts as empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &GlobalArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Parses `contents` as a config file and resolves it against `cli`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseToml`] for invalid TOML.
    pub fn from_toml_str(cli: &GlobalArgs, contents: &str) -> Result<Self, ConfigError> {
        let file: SalesboardConfigFile = toml::from_str(contents)?;
        Ok(Self::resolve(cli, &file))
    }

    fn resolve(cli: &GlobalArgs, file: &SalesboardConfigFile) -> Self {
        let defaults = Self::default();
        let timeout = file
            .gateway
            .timeout_ms
            .map_or(defaults.gateway.timeout, Duration::from_millis);

        Self {
            log_level: cli
                .log_level
                .clone()
                .or_else(|| file.log_level.clone())
                .unwrap_or(defaults.log_level),
            gateway: GatewayConfig {
                base_url: cli
                    .api_url
                    .clone()
                    .or_else(|| file.gateway.base_url.clone())
                    .unwrap_or(defaults.gateway.base_url),
                resource: file
                    .gateway
                    .resource
                    .as_deref()
                    .map_or(defaults.gateway.resource, ResourceName::new),
                timeout,
            },
            retry: RetryPolicy {
                max_attempts: file
                    .retry
                    .max_attempts
                    .unwrap_or(defaults.retry.max_attempts)
                    .max(1),
                base_backoff: file
                    .retry
                    .base_backoff_ms
                    .map_or(defaults.retry.base_backoff, Duration::from_millis),
                max_backoff: file
                    .retry
                    .max_backoff_ms
                    .map_or(defaults.retry.max_backoff, Duration::from_millis),
                attempt_timeout: timeout,
            },
            board: BoardSettings {
                activation_distance: file
                    .board
                    .activation_distance
                    .unwrap_or(defaults.board.activation_distance),
                move_consistency: file
                    .board
                    .move_consistency
                    .unwrap_or(defaults.board.move_consistency),
            },
        }
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<SalesboardConfigFile, ConfigError> {
    if let Some(path) = explicit_path {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(toml::from_str(&contents)?);
    }
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(SalesboardConfigFile::default());
    };
    let path = config_dir.join("salesboard").join("config.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(SalesboardConfigFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
