// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Published sync status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse state of the sync coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Online and not syncing.
    Idle,
    /// A drain-and-refresh pass is running.
    Syncing,
    /// No connectivity (or offline mode is on) and no pass running.
    Offline,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Offline => "offline",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single current sync status, republished on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_syncing: bool,
    pub pending_count: usize,
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Operations given up on after exhausting retries.
    #[serde(default)]
    pub dead_letter_count: usize,
    /// Failure of the most recent pass, cleared by the next successful one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SyncStatus {
    /// Derives the coordinator state.
    ///
    /// A running pass reports `Syncing` even if connectivity dropped
    /// meanwhile; the state settles to `Offline` once the pass ends.
    pub fn state(&self) -> SyncState {
        if self.is_syncing {
            SyncState::Syncing
        } else if !self.is_online {
            SyncState::Offline
        } else {
            SyncState::Idle
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
