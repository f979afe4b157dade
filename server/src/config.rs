//! Server configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so values there behave like
//! real environment variables.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 60;
/// Browsers cap cookie `Max-Age` at 400 days, so longer TTLs are meaningless.
pub const MAX_TOKEN_TTL_SECS: u64 = 400 * 24 * 60 * 60;
const MAX_PRUNE_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} must be set together with {1}")]
    Incomplete(&'static str, &'static str),
}

/// Demo account created at startup so a fresh server can be logged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub prune_interval: Duration,
    pub cookie_secure: bool,
    /// Browser origin allowed to call the API with credentials.
    pub cors_origin: Option<String>,
    pub seed_account: Option<SeedAccount>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            access_ttl: Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::from_secs(DEFAULT_REFRESH_TOKEN_TTL_SECS),
            prune_interval: Duration::from_secs(DEFAULT_PRUNE_INTERVAL_SECS),
            cookie_secure: false,
            cors_origin: None,
            seed_account: None,
        }
    }
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 5000
    /// - `ACCESS_TOKEN_TTL_SECS`: default 900
    /// - `REFRESH_TOKEN_TTL_SECS`: default 604800
    /// - `SESSION_PRUNE_INTERVAL_SECS`: default 60
    /// - `COOKIE_SECURE`: default false
    /// - `CORS_ORIGIN`: credentials-enabled CORS for this origin
    /// - `SEED_ACCOUNT_EMAIL` + `SEED_ACCOUNT_PASSWORD` (+ `SEED_ACCOUNT_NAME`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable values, durations outside
    /// `1..=max` seconds, or a half-specified seed account.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            Err(_) => DEFAULT_PORT,
        };

        let cookie_secure = match std::env::var("COOKIE_SECURE") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
            Err(_) => false,
        };

        let cors_origin = std::env::var("CORS_ORIGIN").ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        Ok(Self {
            port,
            access_ttl: env_secs("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS)?,
            refresh_ttl: env_secs("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS)?,
            prune_interval: env_secs("SESSION_PRUNE_INTERVAL_SECS", DEFAULT_PRUNE_INTERVAL_SECS, MAX_PRUNE_INTERVAL_SECS)?,
            cookie_secure,
            cors_origin,
            seed_account: seed_account_from_env()?,
        })
    }
}

fn seed_account_from_env() -> Result<Option<SeedAccount>, ConfigError> {
    let email = std::env::var("SEED_ACCOUNT_EMAIL").ok().filter(|v| !v.trim().is_empty());
    let password = std::env::var("SEED_ACCOUNT_PASSWORD").ok().filter(|v| !v.is_empty());
    match (email, password) {
        (None, None) => Ok(None),
        (Some(email), Some(password)) => {
            let name = std::env::var("SEED_ACCOUNT_NAME").unwrap_or_else(|_| "Demo Shopper".to_owned());
            Ok(Some(SeedAccount { name, email, password }))
        }
        (Some(_), None) => Err(ConfigError::Incomplete("SEED_ACCOUNT_EMAIL", "SEED_ACCOUNT_PASSWORD")),
        (None, Some(_)) => Err(ConfigError::Incomplete("SEED_ACCOUNT_PASSWORD", "SEED_ACCOUNT_EMAIL")),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A whole-second duration in `1..=max`. Unparsable values fall back to
/// `default` like [`env_parse`]; out-of-range values are rejected.
pub(crate) fn env_secs(key: &'static str, default: u64, max: u64) -> Result<Duration, ConfigError> {
    let secs = env_parse(key, default);
    if secs == 0 || secs > max {
        return Err(ConfigError::Invalid { key, value: secs.to_string() });
    }
    Ok(Duration::from_secs(secs))
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

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
