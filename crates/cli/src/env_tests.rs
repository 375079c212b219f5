// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::TALLY_STATE_DIR, "TALLY_STATE_DIR");
    assert_eq!(vars::TALLY_REMOTE_URL, "TALLY_REMOTE_URL");
    assert_eq!(vars::TALLY_LOG, "TALLY_LOG");
}

// All env mutations live in one test so parallel tests never race on them.
#[test]
fn test_accessors_follow_environment() {
    std::env::remove_var("TALLY_STATE_DIR");
    assert_eq!(state_dir(), None);
    std::env::set_var("TALLY_STATE_DIR", "");
    assert_eq!(state_dir(), None);
    std::env::set_var("TALLY_STATE_DIR", "/tmp/tally-state");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/tally-state")));
    std::env::remove_var("TALLY_STATE_DIR");

    std::env::set_var("TALLY_REMOTE_URL", "ws://example.test:9000");
    assert_eq!(remote_url().as_deref(), Some("ws://example.test:9000"));
    std::env::remove_var("TALLY_REMOTE_URL");
    assert_eq!(remote_url(), None);

    std::env::set_var("TALLY_LOG", "debug");
    assert_eq!(log_filter().as_deref(), Some("debug"));
    std::env::remove_var("TALLY_LOG");
    assert_eq!(log_filter(), None);
}
