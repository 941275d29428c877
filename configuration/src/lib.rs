use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod logging;

pub use logging::setup_logging;

pub type AppConfig = IngestConfig;

/// Environment variable naming the TOML file to layer over the defaults.
pub const CONFIG_PATH_ENV: &str = "INGEST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/ingest-service.toml";
pub const ENV_PREFIX: &str = "INGEST_SERVICE";
/// Plain `PORT` wins over every other source, as hosting platforms expect.
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid PORT value `{0}`")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub ansi: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub transcript: TranscriptConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_step_secs")]
    pub backoff_step_secs: u64,
    #[serde(default = "default_preferred_languages")]
    pub preferred_languages: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

impl TranscriptConfig {
    pub fn backoff_step(&self) -> Duration {
        Duration::from_secs(self.backoff_step_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    /// `cpu`, `cuda` or `auto`.
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
    /// Load the model before the listener is bound instead of on the first request.
    #[serde(default = "default_true")]
    pub preload: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: default_true(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_secs: default_backoff_step_secs(),
            preferred_languages: default_preferred_languages(),
            request_timeout_secs: default_request_timeout_secs(),
            accept_language: default_accept_language(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            model_dir: default_model_dir(),
            device: default_device(),
            batch_size: default_batch_size(),
            max_sequence_length: default_max_sequence_length(),
            preload: default_true(),
        }
    }
}

/// Load the nearest `.env` into the process environment. Runs before logging is set
/// up, so the caller logs the returned path once the subscriber is installed.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Like [`load_dotenv`] for an explicit file.
pub fn load_dotenv_from(path: &Path) -> Option<PathBuf> {
    dotenvy::from_path(path).ok().map(|()| path.to_path_buf())
}

/// Layer defaults, the optional TOML file, `INGEST_SERVICE__*` variables and finally
/// `PORT`. Call [`load_dotenv`] first for `.env` values to take part.
pub fn load_config() -> Result<IngestConfig, ConfigError> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config_from(Path::new(&path))?;

    if let Ok(port) = env::var(PORT_ENV) {
        config.server.port = parse_port(&port)?;
    }

    Ok(config)
}

/// Defaults, then `path` when it exists, then `INGEST_SERVICE__*` variables.
pub fn load_config_from(path: &Path) -> Result<IngestConfig, ConfigError> {
    let built = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("service.transcript.preferred_languages")
                .try_parsing(true),
        )
        .build()?;

    Ok(built.try_deserialize()?)
}

pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step_secs() -> u64 {
    2
}

fn default_preferred_languages() -> Vec<String> {
    vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_accept_language() -> String {
    "en-US".to_string()
}

fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_model_dir() -> String {
    "models/all-MiniLM-L6-v2".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_max_sequence_length() -> usize {
    256
}
