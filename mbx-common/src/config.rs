//! Configuration file loading and storage folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Optional settings read from the MBX TOML config file
///
/// Any field may be omitted; command-line arguments and environment
/// variables take precedence over everything here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Folder for transient downloaded audio
    pub storage_dir: Option<PathBuf>,
    /// Admin ID allowlist for privileged endpoints
    pub admin_ids: Option<Vec<u64>>,
    /// Local player command used by the process voice sink
    pub player_command: Option<Vec<String>>,
}

/// Storage folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_storage_dir(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config) = load_file_config() {
        if let Some(path) = config.storage_dir {
            return path;
        }
    }

    // Priority 4: OS-dependent compiled default
    default_storage_dir()
}

/// Load the MBX config file, if one exists
pub fn load_file_config() -> Result<FileConfig> {
    let path = find_config_file()?;
    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Get the config file path for the platform
///
/// Tries the user config directory first (`~/.config/mbx/config.toml` on
/// Linux), then `/etc/mbx/config.toml` on Unix systems.
pub fn find_config_file() -> Result<PathBuf> {
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("mbx").join("config.toml")) {
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/mbx/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get the OS-dependent default storage folder path
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mbx").join("storage"))
        .unwrap_or_else(|| PathBuf::from("./storage"))
}
