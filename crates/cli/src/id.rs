// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Prefix of locally-generated ids for queued transactions.
pub const LOCAL_ID_PREFIX: &str = "pend";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a local id for a queued transaction.
/// Format: pend-{hash} where hash is first 8 hex chars of
/// SHA256(description + timestamp + sequence)
pub fn generate_local_id(description: &str, created_at: &DateTime<Utc>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    hash_id(description, created_at, seq)
}

fn hash_id(description: &str, created_at: &DateTime<Utc>, seq: u64) -> String {
    let input = format!("{}{}{}", description, created_at.to_rfc3339(), seq);
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]); // First 8 hex chars (4 bytes)
    format!("{}-{}", LOCAL_ID_PREFIX, short_hash)
}

/// Generate a unique local id, handling collisions by appending an
/// incrementing suffix.
pub fn generate_unique_local_id<F>(description: &str, created_at: &DateTime<Utc>, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_local_id(description, created_at);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
