//! Error types for flathdr-config.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading a converter configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Failed to serialize configuration back to TOML.
    #[error("Failed to serialize TOML config: {0}")]
    SerializeToml(#[from] toml::ser::Error),

    /// Configuration validation error.
    #[error("Config validation error: {0}")]
    Validation(String),
}
