//! Configuration file support for neuraldsl
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/neuraldsl/config.toml`
//! - macOS: `~/Library/Application Support/neuraldsl/config.toml`
//! - Windows: `%APPDATA%\neuraldsl\config.toml`

use crate::error::{ConfigError, Result};
use directories::ProjectDirs;
use neuraldsl_core::ValidationOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# neuraldsl configuration file

[validation]
# Set to false to report no diagnostics at all
enable = true

# Report PascalCase model names and treat parameter and training
# warnings as errors
strict = false

# Diagnostics beyond this count are dropped per file
max_number_of_problems = 100

# Regular expressions matched against file paths; matching files are skipped
ignore_patterns = []

# Quiet period in milliseconds before the language server re-validates
debounce_ms = 300

# Layer types reported as deprecated
deprecated_layers = ["SimpleRNN"]
"#;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validation options shared by `check` and `lsp`
    pub validation: ValidationOptions,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if a file is there and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    log::debug!("No config file at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "neuraldsl") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(ConfigError::NoConfigDir)
        }
    }

    /// Create a default config file with comments.
    ///
    /// Writes to `path` or the default location. An existing file is only
    /// replaced when `force` is set.
    pub fn create_default_config_file(path: Option<&Path>, force: bool) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, DEFAULT_CONFIG)?;
        Ok(path)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
