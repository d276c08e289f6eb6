//! TOML configuration file I/O
//!
//! Handles loading and saving quill configuration to/from TOML files
//! in the user's configuration directory.

use crate::config::QuillConfig;
use crate::error::{ConfigError, QuillError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/quill, or QUILL_CONFIG_DIR if set
pub fn get_config_dir() -> Result<PathBuf, QuillError> {
    if let Ok(config_dir) = std::env::var("QUILL_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        QuillError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("quill"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, QuillError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from the default TOML file
pub fn load_config() -> Result<QuillConfig, QuillError> {
    let config_path = get_config_path()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific TOML file
///
/// The loaded configuration is validated, so a missing signing key fails
/// here rather than at first issuance.
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<QuillConfig, QuillError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => QuillError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => QuillError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: QuillConfig = toml::from_str(&contents)?;
    config.validate()?;

    debug!(
        ttl_secs = config.otp.ttl_secs,
        max_attempts = config.otp.max_attempts,
        "Loaded configuration from {:?}",
        path.as_ref()
    );

    Ok(config)
}

/// Save configuration to the default TOML file
pub fn save_config(config: &QuillConfig) -> Result<(), QuillError> {
    let config_path = get_config_path()?;
    save_config_to_path(config, &config_path)
}

/// Save configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(config: &QuillConfig, path: P) -> Result<(), QuillError> {
    config.validate()?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            QuillError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let toml_string = toml::to_string_pretty(config)?;

    std::fs::write(&path, toml_string).map_err(|_e| {
        QuillError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    info!("Saved configuration to {:?}", path.as_ref());
    Ok(())
}

/// Check if a configuration file exists
pub fn config_exists() -> Result<bool, QuillError> {
    let config_path = get_config_path()?;
    Ok(config_path.exists())
}
