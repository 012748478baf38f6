//! Runtime configuration
//!
//! Values come from the environment (a `.env` file is honoured by the binary)
//! and can be overridden on the command line.

use crate::{
    constants::{
        COINGECKO_API_URL, DEFAULT_BIND, DEFAULT_EXPORT_PATH, DEFAULT_PORT, DEFAULT_REFRESH_SECS,
        REQUEST_TIMEOUT_SECS,
    },
    error::ConfigError,
    interval::RefreshInterval,
};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Dashboard configuration derived from environment variables.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub bind: String,
    pub port: u16,
    pub refresh_interval: RefreshInterval,
    pub export_path: PathBuf,
    pub export_enabled: bool,
    /// Base URL of the CoinGecko API (no trailing endpoint)
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            refresh_interval: RefreshInterval::default(),
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            export_enabled: true,
            api_url: COINGECKO_API_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name).ok().map(|s| s.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
        _ => Ok(default),
    }
}

fn env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name).ok().map(|s| s.trim().to_lowercase()) {
        Some(raw) if raw.is_empty() => Ok(default),
        Some(raw) => match raw.as_str() {
            "1" | "true" | "yes" | "y" | "on" => Ok(true),
            "0" | "false" | "no" | "n" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
        },
        None => Ok(default),
    }
}

impl DashboardConfig {
    /// Reads the configuration from the environment
    ///
    /// Unset variables fall back to defaults; set but malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let refresh_secs = env_parse("DASHBOARD_REFRESH_SECS", DEFAULT_REFRESH_SECS)?;
        let timeout_secs = env_parse("DASHBOARD_REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            bind: env_str("DASHBOARD_BIND", DEFAULT_BIND),
            port: env_parse("DASHBOARD_PORT", DEFAULT_PORT)?,
            refresh_interval: RefreshInterval::from_secs(refresh_secs)?,
            export_path: PathBuf::from(env_str("DASHBOARD_EXPORT_PATH", DEFAULT_EXPORT_PATH)),
            export_enabled: env_bool("DASHBOARD_EXPORT_ENABLED", true)?,
            api_url: env_str("COINGECKO_API_URL", COINGECKO_API_URL),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Socket address the dashboard binds to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.bind, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: "bind address".to_string(),
            value: raw,
        })
    }
}
