// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod backup;
pub mod cache;
pub mod config;
pub mod dead_letters;
pub mod init;
pub mod pending;
pub mod record;
pub mod status;
pub mod sync;
pub mod toggle;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tally_core::{Clock, KeyValueStore, SqliteStore, SystemClock};

use crate::cli::OutputFormat;
use crate::config::{db_path, validate_remote_url, Config};
use crate::error::Result;
use crate::lock::StateLock;
use crate::sync::{
    BackupService, ConnectivityMonitor, DataCache, PendingOperationStore, SyncComponents,
    SyncCoordinator, TcpProbe, WebSocketRemote,
};

/// Whether a command needs the state lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reads only.
    Shared,
    /// Talks to the server or mutates the queue.
    Exclusive,
}

/// An opened state directory with a wired-up coordinator.
pub struct Context {
    pub state_dir: PathBuf,
    pub config: Config,
    pub coordinator: Arc<SyncCoordinator>,
    _lock: Option<StateLock>,
}

impl Context {
    pub fn open(state_dir: &Path, access: Access) -> Result<Self> {
        let config = Config::load(state_dir)?;
        let lock = match access {
            Access::Exclusive => Some(StateLock::acquire(state_dir)?),
            Access::Shared => None,
        };
        let coordinator = Arc::new(build_coordinator(state_dir, &config)?);
        Ok(Context {
            state_dir: state_dir.to_path_buf(),
            config,
            coordinator,
            _lock: lock,
        })
    }
}

/// Wire the production stack: SQLite state, TCP probe, WebSocket remote.
pub fn build_coordinator(state_dir: &Path, config: &Config) -> Result<SyncCoordinator> {
    let url = config.remote_url();
    validate_remote_url(&url)?;

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&db_path(state_dir))?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let probe = TcpProbe::from_url(&url, config.probe_timeout())?;
    tracing::debug!(url = %url, probe = %probe.address(), "opening sync stack");

    let components = SyncComponents {
        remote: Arc::new(WebSocketRemote::new(url, config.request_timeout())),
        monitor: Arc::new(ConnectivityMonitor::new(Arc::new(probe))),
        queue: Arc::new(PendingOperationStore::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.queue_limits(),
        )),
        cache: Arc::new(DataCache::new(Arc::clone(&store), Arc::clone(&clock))),
        backups: Arc::new(BackupService::new(store, clock)),
    };
    Ok(SyncCoordinator::new(components, config.coordinator_settings())?)
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Print a list as JSON, or each item's text lines.
pub fn print_list<T, F>(items: &[T], output: OutputFormat, empty: &str, format: F) -> Result<()>
where
    T: Serialize,
    F: Fn(&T) -> Vec<String>,
{
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", empty);
            }
            for item in items {
                for line in format(item) {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
