// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tallyrs - offline-first transaction sync and backup.
//!
//! This crate provides the functionality behind the `tally` CLI: a local
//! queue of transactions recorded while offline, a cache of server data,
//! snapshot backups, and the coordinator that keeps them in step with the
//! server.
//!
//! # Main Components
//!
//! - [`sync::SyncCoordinator`] - the sync state machine
//! - [`sync::PendingOperationStore`] - durable FIFO of unsent transactions
//! - [`sync::DataCache`] - last-known server collections and preferences
//! - [`sync::BackupService`] - full snapshots of server data
//! - [`Config`] - `config.toml` in the state directory
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use tallyrs::{init_state_dir, Config};
//!
//! let config = init_state_dir(&state_dir, Some("ws://127.0.0.1:7890"))?;
//! let coordinator = tallyrs::build_coordinator(&state_dir, &config)?;
//! coordinator.handle_manual_sync().await?;
//! ```

mod cli;
mod commands;
mod display;
mod lock;
mod logging;

pub mod config;
pub mod env;
pub mod error;
pub mod id;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat, Switch};
pub use commands::build_coordinator;
pub use config::{init_state_dir, resolve_state_dir, Config};
pub use error::{Error, Result};

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let state_dir = resolve_state_dir(cli.state_dir.as_deref())?;

    match &cli.command {
        Command::Watch { log_file: true } => logging::init_file(&config::log_path(&state_dir)),
        _ => logging::init_stderr(),
    }

    match cli.command {
        Command::Init { remote } => commands::init::run(&state_dir, remote),
        Command::Config { output } => commands::config::run(&state_dir, output),
        Command::Record {
            kind,
            amount,
            category,
            description,
            output,
        } => commands::record::run(&state_dir, kind, amount, category, description, output),
        Command::Pending { discard, output } => commands::pending::run(&state_dir, discard, output),
        Command::DeadLetters { clear, output } => {
            commands::dead_letters::run(&state_dir, clear, output)
        }
        Command::Cache { collection, output } => {
            commands::cache::run(&state_dir, collection, output)
        }
        Command::Status { output } => commands::status::run(&state_dir, output),
        Command::Sync { output } => commands::sync::run(&state_dir, output),
        Command::Backup { file, show } => commands::backup::run(&state_dir, file, show),
        Command::AutoSync { state } => commands::toggle::run_auto_sync(&state_dir, state),
        Command::Offline { state } => commands::toggle::run_offline(&state_dir, state),
        Command::Watch { .. } => commands::watch::run(&state_dir),
    }
}
