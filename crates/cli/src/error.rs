// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{ProbeError, QueueError, SyncError};

/// All possible errors that can occur in the tallyrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'tally init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("could not determine a state directory\n  hint: pass --state-dir or set TALLY_STATE_DIR")]
    NoStateDir,

    #[error("another tally process is syncing ({0})\n  hint: wait for it to finish, or stop 'tally watch'")]
    LockHeld(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid remote URL '{url}': {reason}")]
    InvalidRemoteUrl { url: String, reason: String },

    #[error("pending transaction not found: {0}")]
    PendingNotFound(String),

    #[error("no backup has been made yet\n  hint: run 'tally backup' while online")]
    NoBackup,

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Core(#[from] tally_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ProbeError> for Error {
    fn from(e: ProbeError) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type alias for tallyrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
