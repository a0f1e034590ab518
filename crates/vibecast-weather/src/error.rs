//! Weather pipeline error types.

use thiserror::Error;

use crate::types::ProviderId;

/// Shown whenever live weather could not be loaded
pub const LIVE_WEATHER_FAILED: &str = "Could not load live weather. Check your network or API key.";

/// How a single provider attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network error, timeout or non-2xx status
    Transport,
    /// 2xx response without the fields the mapper needs
    Shape,
}

/// Failure of one provider attempt (request or normalization).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

impl FetchError {
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Shape(_) => FailureKind::Shape,
            Self::Transport(_) | Self::Timeout(_) | Self::Status { .. } => FailureKind::Transport,
        }
    }
}

/// Weather fetch errors surfaced to callers
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{provider} failed: {source}")]
    Live {
        provider: ProviderId,
        #[source]
        source: FetchError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl WeatherError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        LIVE_WEATHER_FAILED
    }
}

/// Location service errors
#[derive(Debug, Clone, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Persistent storage errors. Never surfaced past the cache.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
