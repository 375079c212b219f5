// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `<state-dir>/config.toml` and includes:
//! - `[remote]`: server URL and timeouts
//! - `[sync]`: auto-sync default, retry and capacity limits, page sizes
//!
//! Every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{CoordinatorSettings, OverflowPolicy, QueueLimits, MAX_RETRIES};

const APP_DIR_NAME: &str = "tally";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "tally.db";
const LOCK_FILE_NAME: &str = "tally.lock";
const LOG_FILE_NAME: &str = "tally.log";

pub const DEFAULT_REMOTE_URL: &str = "ws://127.0.0.1:7890";

/// Configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Remote server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL (`ws://...` or `wss://...`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Max time for one API call in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Max time for a reachability probe in milliseconds (default: 3000).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: default_url(),
            request_timeout_ms: default_request_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Sync behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Auto-sync until toggled with `tally auto-sync` (default: true).
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
    /// Failed submissions before an entry is dead-lettered (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before auto-syncing after reconnect in milliseconds (default: 2000).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Transactions fetched per refresh (default: 100).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Transactions fetched per backup (default: 1000).
    #[serde(default = "default_backup_page_size")]
    pub backup_page_size: usize,
    /// Connectivity poll period for `tally watch` in seconds (default: 15).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Pending queue capacity. Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pending: Option<usize>,
    /// What happens when the queue is full (default: reject).
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            auto_sync: default_auto_sync(),
            max_retries: default_max_retries(),
            debounce_ms: default_debounce_ms(),
            page_size: default_page_size(),
            backup_page_size: default_backup_page_size(),
            poll_interval_secs: default_poll_interval_secs(),
            max_pending: None,
            overflow: OverflowPolicy::default(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_REMOTE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_auto_sync() -> bool {
    true
}

fn default_max_retries() -> u32 {
    MAX_RETRIES
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_page_size() -> usize {
    100
}

fn default_backup_page_size() -> usize {
    1_000
}

fn default_poll_interval_secs() -> u64 {
    15
}

/// Checks that a remote URL is a WebSocket URL.
pub fn validate_remote_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).map_err(|e| Error::InvalidRemoteUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(Error::InvalidRemoteUrl {
            url: url.to_string(),
            reason: format!("scheme must be ws or wss, got {other}"),
        }),
    }
}

impl Config {
    /// Creates a default config pointing at `url`.
    pub fn with_remote(url: &str) -> Result<Self> {
        validate_remote_url(url)?;
        let mut config = Config::default();
        config.remote.url = url.to_string();
        Ok(config)
    }

    /// Loads configuration from the given state directory.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(Error::NotInitialized);
        }
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Saves configuration to the given state directory.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// The remote URL, with `TALLY_REMOTE_URL` taking precedence.
    pub fn remote_url(&self) -> String {
        env::remote_url().unwrap_or_else(|| self.remote.url.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.request_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.probe_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sync.poll_interval_secs)
    }

    pub fn queue_limits(&self) -> QueueLimits {
        QueueLimits {
            max_retries: self.sync.max_retries,
            max_pending: self.sync.max_pending,
            overflow: self.sync.overflow,
        }
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            auto_sync: self.sync.auto_sync,
            debounce: Duration::from_millis(self.sync.debounce_ms),
            page_size: self.sync.page_size,
            backup_page_size: self.sync.backup_page_size,
        }
    }
}

/// Resolve the state directory: explicit flag, then `TALLY_STATE_DIR`, then
/// the platform data directory.
pub fn resolve_state_dir(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env::state_dir() {
        return Ok(dir);
    }
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or(Error::NoStateDir)
}

pub fn db_path(state_dir: &Path) -> PathBuf {
    state_dir.join(DB_FILE_NAME)
}

pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOCK_FILE_NAME)
}

pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOG_FILE_NAME)
}

/// Initialize a state directory with a config pointing at `remote`.
pub fn init_state_dir(state_dir: &Path, remote: Option<&str>) -> Result<Config> {
    if state_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(state_dir.display().to_string()));
    }

    let config = match remote {
        Some(url) => Config::with_remote(url)?,
        None => Config::default(),
    };
    fs::create_dir_all(state_dir)?;
    config.save(state_dir)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
