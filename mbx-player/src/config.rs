//! Runtime configuration for the player daemon
//!
//! Merges command-line arguments, environment variables, and the shared
//! TOML config file into one resolved `Config`. Priority is always
//! CLI > environment > config file > compiled default.

use crate::error::{Error, Result};
use crate::queue::QueuePolicy;
use crate::sink::DEFAULT_PLAYER_COMMAND;
use mbx_common::config::{load_file_config, resolve_storage_dir};
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming the storage folder
pub const STORAGE_DIR_ENV: &str = "MBX_STORAGE_DIR";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Fully resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// Folder for transient downloaded audio
    pub storage_dir: PathBuf,
    /// IDs allowed through the admin endpoints; empty locks admin out
    pub admin_ids: Vec<u64>,
    /// Local player invocation for the process voice sink
    pub player_command: Vec<String>,
    /// Cursor-correction policy for queue mutations
    pub queue_policy: QueuePolicy,
}

impl Config {
    /// Resolve the configuration from CLI values plus environment and
    /// the config file
    ///
    /// `cli_admin_ids` and `cli_player_command` override the config file
    /// entirely when given; they are not merged with it.
    pub fn resolve(
        cli_port: Option<u16>,
        cli_storage_dir: Option<&str>,
        cli_admin_ids: &[u64],
        cli_player_command: Option<&str>,
        permissive_queue: bool,
    ) -> Result<Self> {
        let file = load_file_config().unwrap_or_default();

        let storage_dir = resolve_storage_dir(cli_storage_dir, STORAGE_DIR_ENV);

        let admin_ids = if !cli_admin_ids.is_empty() {
            cli_admin_ids.to_vec()
        } else {
            file.admin_ids.unwrap_or_default()
        };
        if admin_ids.is_empty() {
            debug!("No admin IDs configured; admin endpoints will reject all requests");
        }

        let player_command = match cli_player_command {
            Some(raw) => {
                let parts: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
                if parts.is_empty() {
                    return Err(Error::Config("player command must not be empty".to_string()));
                }
                parts
            }
            None => file.player_command.unwrap_or_else(|| {
                DEFAULT_PLAYER_COMMAND.iter().map(|s| s.to_string()).collect()
            }),
        };

        let queue_policy = if permissive_queue {
            QueuePolicy {
                reset_cursor_on_clear: false,
                clamp_cursor_on_remove: false,
            }
        } else {
            QueuePolicy::default()
        };

        Ok(Self {
            port: cli_port.unwrap_or(DEFAULT_PORT),
            storage_dir,
            admin_ids,
            player_command,
            queue_policy,
        })
    }
}
