use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:9006";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SUGGESTION_COUNT: usize = 5;
pub const MAX_SUGGESTION_COUNT: usize = 50;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Overrides the Host header, e.g. when talking to a gateway by IP.
    pub api_host: Option<String>,
    pub request_timeout: Duration,
    pub suggestion_count: usize,
    pub state_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_host: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            suggestion_count: DEFAULT_SUGGESTION_COUNT,
            state_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = ClientConfig::default();

        let api_base_url = lookup("FEED_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let request_timeout = match lookup("FEED_REQUEST_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_number("FEED_REQUEST_TIMEOUT_SECS", &value)?),
            None => defaults.request_timeout,
        };

        let suggestion_count = match lookup("FEED_SUGGESTION_COUNT") {
            Some(value) => parse_number::<usize>("FEED_SUGGESTION_COUNT", &value)?,
            None => defaults.suggestion_count,
        };

        Ok(ClientConfig {
            api_base_url,
            api_host: lookup("FEED_API_HOST").filter(|h| !h.is_empty()),
            request_timeout,
            suggestion_count: suggestion_count.clamp(1, MAX_SUGGESTION_COUNT),
            state_path: lookup("FEED_STATE_PATH").map(PathBuf::from),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
