use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.scrapegraphai.com/v1";
const DEFAULT_BIND: &str = "0.0.0.0:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SGAI_RELAY_BASE_URL is not a valid http(s) URL: {0}")]
    BaseUrl(String),
    #[error("SGAI_RELAY_BIND is not a valid socket address: {0}")]
    Bind(String),
    #[error("SGAI_RELAY_TIMEOUT_SECS is not a positive integer: {0}")]
    Timeout(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub bind: SocketAddr,
    pub timeout: Option<Duration>,
    pub insecure_ssl: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("SGAI_RELAY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let base_url = parse_base_url(&base_url)?;

        let bind = lookup("SGAI_RELAY_BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind: SocketAddr = bind.parse().map_err(|_| ConfigError::Bind(bind.clone()))?;

        let timeout = match lookup("SGAI_RELAY_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::Timeout(raw)),
            },
            None => None,
        };

        let insecure_ssl = lookup("SGAI_RELAY_INSECURE_SSL").as_deref() == Some("1");

        Ok(Self {
            base_url,
            bind,
            timeout,
            insecure_ssl,
        })
    }

    /// Configuration pointing at an arbitrary base URL, everything else default.
    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == "SGAI_RELAY_BASE_URL").then(|| base_url.to_string()))
    }
}

// Stored with a trailing slash so `Url::join` appends instead of replacing
// the last path segment.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized).map_err(|_| ConfigError::BaseUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::BaseUrl(raw.to_string())),
    }
}
