//! Error types for the neuraldsl CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory could be determined
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// An explicitly requested config file does not exist
    #[error("Config file not found at {}", .0.display())]
    NotFound(PathBuf),

    /// Refusing to overwrite an existing config file
    #[error("Config file already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
