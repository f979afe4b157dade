//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Period of the proactive session refresh.
    pub refresh_interval: Duration,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a config for an explicit base URL with default timings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute `http`/`https` URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `API_BASE_URL`: default `http://localhost:5000/api`
    /// - `SESSION_REFRESH_INTERVAL_SECS`: default 600
    /// - `API_TIMEOUT_SECS`: default 10
    ///
    /// Zero or unparsable durations fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `API_BASE_URL` is malformed.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        Ok(Self::new(&base_url)?
            .with_refresh_interval(env_secs("SESSION_REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS))
            .with_request_timeout(env_secs("API_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)))
    }

    /// Point the config at another API base URL, keeping its timings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] under the same rules as
    /// [`ClientConfig::new`].
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ClientError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Join the base URL and `path` with exactly one slash.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim();
        if path.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Whole seconds from `key`; zero counts as unset.
fn env_secs(key: &str, default: u64) -> Duration {
    match env_parse(key, default) {
        0 => Duration::from_secs(default),
        secs => Duration::from_secs(secs),
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl(format!("{trimmed}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_owned()),
        other => Err(ClientError::InvalidBaseUrl(format!("unsupported scheme {other}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
