// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive access to a state directory.
//!
//! Commands that talk to the server or mutate the pending queue hold
//! `<state-dir>/tally.lock` for their whole run, so a foreground
//! `tally sync` never races a `tally watch` loop over the same queue.

use std::fs::{self, File};
use std::path::Path;

use fs2::FileExt;

use crate::config::lock_path;
use crate::error::{Error, Result};

/// Held advisory lock. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

impl StateLock {
    /// Take the lock without waiting.
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        let path = lock_path(state_dir);
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| Error::LockHeld(path.display().to_string()))?;
        tracing::debug!(path = %path.display(), "state lock acquired");
        Ok(StateLock { _file: file })
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
