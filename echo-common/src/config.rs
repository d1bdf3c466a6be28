//! Configuration loading and data directory resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Optional settings read from the ECHO config file
///
/// Every field is optional; missing values fall through to environment
/// variables or compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data directory holding the database
    pub data_dir: Option<String>,
    /// GLM chat-completion API key
    pub glm_api_key: Option<String>,
    /// HTTP listen port
    pub port: Option<u16>,
}

/// Data directory resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `ECHO_DATA_DIR` environment variable
/// 3. TOML config file `data_dir` key
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("ECHO_DATA_DIR") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_config.data_dir.as_deref() {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 4: OS-dependent compiled default
    default_data_dir()
}

/// Load the TOML config file, if one exists for this platform
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))
}

/// Get the configuration file path for the platform
///
/// On Linux the user config (`~/.config/echo/config.toml`) is preferred over
/// the system config (`/etc/echo/config.toml`).
fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("echo").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/echo/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default data directory path
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("echo"))
        .unwrap_or_else(|| PathBuf::from("./echo_data"))
}

/// Database file path inside the data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("echo.db")
}
