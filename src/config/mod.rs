use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_JWT_EXPIRATION: &str = "10d";
const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 5000;
const DEFAULT_CHART_API_URL: &str = "https://api.deezer.com/chart";
const DEFAULT_CHART_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {0} must not be empty")]
    Empty(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub chart_api_url: String,
    pub chart_cache_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    pub database_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            let value = lookup(key).ok_or(ConfigError::Missing(key))?;
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(key));
            }
            Ok(value)
        };

        let jwt_expiration = lookup("JWT_EXPIRATION")
            .unwrap_or_else(|| DEFAULT_JWT_EXPIRATION.to_string());
        let jwt_expiration_secs =
            parse_duration_secs(&jwt_expiration).ok_or(ConfigError::Invalid {
                key: "JWT_EXPIRATION",
                value: jwt_expiration.clone(),
            })?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_or(&lookup, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            chart_api_url: lookup("CHART_API_URL")
                .unwrap_or_else(|| DEFAULT_CHART_API_URL.to_string()),
            chart_cache_ttl_secs: parse_or(&lookup, "CHART_CACHE_TTL", DEFAULT_CHART_CACHE_TTL_SECS)?,
            upstream_timeout_secs: parse_or(
                &lookup,
                "UPSTREAM_TIMEOUT",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn chart_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.chart_cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Parses `10d`, `24h`, `30m`, `45s` or a bare number of seconds.
fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last()? {
        'd' => (&raw[..raw.len() - 1], 86_400),
        'h' => (&raw[..raw.len() - 1], 3_600),
        'm' => (&raw[..raw.len() - 1], 60),
        's' => (&raw[..raw.len() - 1], 1),
        _ => (raw, 1),
    };
    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}
