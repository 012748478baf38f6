//! Error types for the live crypto dashboard

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching market data from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(e)
        }
    }
}

/// Errors that can occur when writing the spreadsheet export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Invalid runtime configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("refresh interval {secs}s is outside [{min}, {max}]")]
    IntervalOutOfRange { secs: u64, min: u64, max: u64 },

    #[error("refresh interval {secs}s is not a multiple of {step}s")]
    IntervalOffStep { secs: u64, step: u64 },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Errors surfaced through the dashboard HTTP API
#[derive(Debug, Error)]
pub enum DashboardError {
    /// No poll cycle has completed yet
    #[error("market data not available yet")]
    NotReady,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DashboardError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status(), axum::Json(body)).into_response()
    }
}
