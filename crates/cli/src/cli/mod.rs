// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tally_core::{Amount, TransactionKind};

use crate::sync::Collection;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_kind(s: &str) -> Result<TransactionKind, String> {
    s.parse().map_err(|_| "expected 'income' or 'expense'".to_string())
}

fn parse_amount(s: &str) -> Result<Amount, String> {
    s.parse::<Amount>().map_err(|e| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// On/off argument for preference toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

#[derive(Parser)]
#[command(name = "tally")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first transaction sync and backup")]
#[command(
    long_about = "Offline-first transaction sync and backup.\n\n\
    Record transactions with or without a connection. Anything recorded offline is \
    queued locally and submitted in order once the server is reachable again."
)]
#[command(after_help = "\
Quickstart:
  tally init --remote ws://127.0.0.1:7890
  tally record expense 12.50 --category cat-food -d lunch
  tally status
  tally sync")]
pub struct Cli {
    /// Use <path> as the state directory
    #[arg(long = "state-dir", global = true, value_name = "path")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Setup
    // ─────────────────────────────────────────────────────────────────────────
    /// Initialize the state directory
    #[command(after_help = "\
Examples:
  tally init                                  Use the default server
  tally init --remote wss://sync.example.com  Use a specific server")]
    Init {
        /// WebSocket URL of the sync server
        #[arg(long, value_name = "URL")]
        remote: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Transactions
    // ─────────────────────────────────────────────────────────────────────────
    /// Record a transaction (queued if offline)
    #[command(after_help = "\
Examples:
  tally record expense 12.50 --category cat-food
  tally record income 2500 -c cat-salary -d \"March salary\"")]
    Record {
        /// Transaction kind (income, expense)
        #[arg(value_parser = parse_kind)]
        kind: TransactionKind,

        /// Amount, e.g. 12.50
        #[arg(value_parser = parse_amount)]
        amount: Amount,

        /// Category id
        #[arg(long, short, value_parser = non_empty_string)]
        category: String,

        /// Free-form description
        #[arg(long, short, default_value = "")]
        description: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List queued transactions, or discard one
    Pending {
        /// Move a queued transaction to the dead letters
        #[arg(long, value_name = "ID")]
        discard: Option<String>,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List transactions that were given up on
    #[command(name = "dead-letters")]
    DeadLetters {
        /// Remove all dead letters
        #[arg(long)]
        clear: bool,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show a cached collection
    Cache {
        /// Collection (transactions, categories, alerts, reminders)
        collection: Collection,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────
    /// Show connectivity, queue and sync status
    Status {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Submit queued transactions and refresh the cache
    Sync {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Snapshot all server data
    #[command(after_help = "\
Examples:
  tally backup                       Create a backup
  tally backup --output backup.json  Create a backup and export it
  tally backup --show                Print the latest backup")]
    Backup {
        /// Also write the backup to FILE as JSON
        #[arg(long = "output", short = 'o', value_name = "FILE")]
        file: Option<PathBuf>,

        /// Print the latest backup instead of creating one
        #[arg(long)]
        show: bool,
    },

    /// Turn automatic syncing on or off
    #[command(name = "auto-sync")]
    AutoSync {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Force offline mode on or off
    Offline {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Watch connectivity and sync automatically until interrupted
    #[command(long_about = "Watch connectivity and sync automatically until interrupted.\n\n\
        Holds the state lock while running. 'tally record' still queues \
        transactions, but 'sync', 'backup', 'auto-sync' and 'offline' are \
        refused until watch stops.")]
    Watch {
        /// Log to <state-dir>/tally.log instead of stderr
        #[arg(long)]
        log_file: bool,
    },
}

#[cfg(test)]
#[path = "../cli_tests.rs"]
mod tests;
