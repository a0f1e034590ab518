//! Error types for loading and validating configuration.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    #[error("Configuration IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NoConfigDir => "No configuration directory available. Using defaults.",
            ConfigError::Io(_) => "Unable to read or write the configuration file.",
            ConfigError::Parse(_) => "The configuration file is malformed. Check its syntax.",
            ConfigError::Serialize(_) => "Unable to save the configuration.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}
