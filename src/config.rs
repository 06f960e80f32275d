//! Process configuration pulled from the environment, with `.env` support
//! for local development.

use secrecy::SecretString;
use std::env;
use tracing::Level;

/// Samples per chunk pulled from the microphone stream.
pub const INPUT_CHUNK_SIZE: usize = 1024;
/// Samples per chunk pushed to the playback stream.
pub const OUTPUT_CHUNK_SIZE: usize = 1024;
/// Playback ring buffer capacity expressed as milliseconds of audio.
pub const OUTPUT_LATENCY_MS: usize = 1000;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

#[derive(Debug)]
pub struct Config {
    /// Base URL of the interview backend, without a trailing slash.
    pub api_base_url: String,
    /// Backend API key.
    pub api_key: SecretString,
    /// Endpoint that answers session offers.
    pub negotiate_url: String,
    /// Endpoint carrying the realtime event channel.
    pub channel_url: String,
    /// Preferred capture device name; the default input when unset.
    pub capture_device: Option<String>,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("INTERVIEW_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let api_key = env::var("INTERVIEW_API_KEY")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingVar("INTERVIEW_API_KEY".to_string()))?;

        let negotiate_url = env::var("REALTIME_NEGOTIATE_URL")
            .map_err(|_| ConfigError::MissingVar("REALTIME_NEGOTIATE_URL".to_string()))?;

        let channel_url = env::var("REALTIME_CHANNEL_URL")
            .map_err(|_| ConfigError::MissingVar("REALTIME_CHANNEL_URL".to_string()))?;

        let capture_device = env::var("CAPTURE_DEVICE").ok();

        let log_level = match env::var("RUST_LOG") {
            Ok(level) => level
                .parse::<Level>()
                .map_err(|_| ConfigError::InvalidLogLevel(level))?,
            Err(_) => Level::INFO,
        };

        Ok(Config {
            api_base_url,
            api_key,
            negotiate_url,
            channel_url,
            capture_device,
            log_level,
        })
    }
}
