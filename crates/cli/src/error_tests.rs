// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::sync::RemoteError;
use yare::parameterized;

#[test]
fn test_error_not_initialized_display() {
    let err = Error::NotInitialized;
    assert!(err.to_string().contains("not initialized"));
    assert!(err.to_string().contains("tally init"));
}

#[test]
fn test_error_already_initialized_display() {
    let err = Error::AlreadyInitialized("/path/to/state".to_string());
    assert!(err.to_string().contains("already initialized"));
    assert!(err.to_string().contains("/path/to/state"));
}

#[parameterized(
    no_state_dir = { Error::NoStateDir, "TALLY_STATE_DIR" },
    lock_held = { Error::LockHeld("/tmp/tally.lock".to_string()), "tally watch" },
    no_backup = { Error::NoBackup, "tally backup" },
    pending = { Error::PendingNotFound("pend-1234abcd".to_string()), "pend-1234abcd" },
)]
fn test_error_hints(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn test_sync_error_is_transparent() {
    let err: Error = SyncError::NetworkUnavailable.into();
    assert!(err.to_string().starts_with("network unavailable"));
    assert!(err.to_string().contains("tally offline off"));
}

#[test]
fn test_refresh_failure_names_collection() {
    let err: Error = SyncError::RefreshFailed {
        collection: crate::sync::Collection::Reminders,
        source: RemoteError::Timeout(std::time::Duration::from_secs(10)),
    }
    .into();
    let msg = err.to_string();
    assert!(msg.contains("reminders"));
    assert!(msg.contains("timed out"));
}

#[test]
fn test_queue_full_hint() {
    let err: Error = QueueError::QueueFull(500).into();
    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("tally pending --discard"));
}

#[test]
fn test_probe_error_is_config_error() {
    let err: Error = crate::sync::TcpProbe::from_url("nonsense", std::time::Duration::from_secs(1))
        .unwrap_err()
        .into();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_io_error_conversion() {
    let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(err.to_string().contains("I/O error"));
}
