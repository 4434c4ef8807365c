use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub type AppConfig = TranscribeConfig;

const CONFIG_PATH_ENV: &str = "TRANSCRIBE_SERVICE_CONFIG";
const RUN_ENV: &str = "RUN_ENV";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TranscribeConfig {
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_wait_secs")]
    pub initial_wait_secs: u64,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u32,
    #[serde(default = "default_decode_sample_rate")]
    pub decode_sample_rate_hz: u32,
    #[serde(default)]
    pub ffmpeg_path: Option<String>,
    #[serde(default = "default_ffmpeg_search_dir")]
    pub ffmpeg_search_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            audio: AudioConfig::default(),
            upload: UploadConfig::default(),
            pipeline: PipelineConfig::default(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_inference_endpoint(),
            api_key: String::new(),
            max_retries: default_max_retries(),
            initial_wait_secs: default_initial_wait_secs(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            chunk_ms: default_chunk_ms(),
            decode_sample_rate_hz: default_decode_sample_rate(),
            ffmpeg_path: None,
            ffmpeg_search_dir: default_ffmpeg_search_dir(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl TranscribeConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies environment overrides on top of file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("TRANSCRIBE_SERVICE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("TRANSCRIBE_SERVICE_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "TRANSCRIBE_SERVICE_PORT".to_string(),
                message: format!("`{port}` is not a valid port"),
            })?;
        }
        if let Some(level) = lookup("TRANSCRIBE_SERVICE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(api_key) = lookup("HUGGINGFACE_API_KEY") {
            self.service.inference.api_key = api_key;
        }
        if let Some(dir) = lookup("UPLOAD_FOLDER") {
            self.service.upload.dir = dir;
        }
        if let Some(path) = lookup("FFMPEG_PATH").filter(|value| !value.trim().is_empty()) {
            self.service.audio.ffmpeg_path = Some(path);
        }
        Ok(())
    }
}

pub fn load_config() -> Result<TranscribeConfig, ConfigError> {
    let mut config = match config_file_path() {
        Some(path) => TranscribeConfig::from_toml_file(&path)?,
        None => TranscribeConfig::default(),
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(explicit));
    }
    let run_env = std::env::var(RUN_ENV).unwrap_or_else(|_| "development".to_string());
    let candidate = PathBuf::from("config").join(format!("{run_env}.toml"));
    candidate.is_file().then_some(candidate)
}

pub fn setup_logging(config: &TranscribeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_inference_endpoint() -> String {
    "https://api-inference.huggingface.co/models/openai/whisper-large-v2".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_wait_secs() -> u64 {
    20
}

fn default_http_timeout_ms() -> u64 {
    120_000
}

fn default_chunk_ms() -> u32 {
    30_000
}

fn default_decode_sample_rate() -> u32 {
    16_000
}

fn default_ffmpeg_search_dir() -> String {
    "bin".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    256 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["mp3", "wav", "m4a", "ogg", "mp4"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}
