// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent key-value storage.
//!
//! Every durable piece of client state (pending queue, cached collections,
//! timestamps, backups) lives under a fixed string key as an opaque text
//! value. [`SqliteStore`] keeps the values in a single SQLite table;
//! [`MemoryStore`] is the ephemeral implementation used by tests.
//!
//! Multi-key writes go through [`KeyValueStore::write_batch`], which is
//! all-or-nothing. Read-modify-write cycles go through
//! [`KeyValueStore::update`], which is atomic across every handle on the
//! same database, including handles in other processes.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// SQL schema for the key-value table.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
"#;

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl BatchOp {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        BatchOp::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        BatchOp::Remove { key: key.into() }
    }

    /// Serializes `value` as JSON under `key`.
    pub fn set_json<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Result<Self> {
        Ok(BatchOp::set(key, serde_json::to_string(value)?))
    }
}

/// Callback for [`KeyValueStore::update`].
pub type UpdateFn<'a> = dyn FnMut(&[Option<String>]) -> Result<Vec<BatchOp>> + 'a;

/// Durable string storage scoped by fixed keys.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Applies all writes atomically: either every entry lands or none does.
    fn write_batch(&self, ops: &[BatchOp]) -> Result<()>;

    /// Reads `keys` and applies the writes `edit` returns for them, with no
    /// other writer in between. `edit` receives the values in `keys` order.
    /// If it fails, nothing is written.
    fn update(&self, keys: &[&str], edit: &mut UpdateFn<'_>) -> Result<()>;

    /// Writes a single value.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.write_batch(&[BatchOp::set(key, value)])
    }

    /// Removes a single value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()> {
        self.write_batch(&[BatchOp::remove(key)])
    }
}

/// Reads and deserializes a JSON value.
///
/// A value that fails to parse is reported as corrupted data for that key.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::CorruptedData {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write_batch(&self, ops: &[BatchOp]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let tx = conn.transaction()?;
        apply_ops(&tx, ops)?;
        tx.commit()?;
        Ok(())
    }

    fn update(&self, keys: &[&str], edit: &mut UpdateFn<'_>) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        // IMMEDIATE takes the database write lock before the reads
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut current = Vec::with_capacity(keys.len());
        for key in keys {
            let value: Option<String> = tx
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?;
            current.push(value);
        }
        let ops = edit(&current)?;
        apply_ops(&tx, &ops)?;
        tx.commit()?;
        Ok(())
    }
}

fn apply_ops(tx: &rusqlite::Transaction<'_>, ops: &[BatchOp]) -> Result<()> {
    for op in ops {
        match op {
            BatchOp::Set { key, value } => {
                tx.execute(
                    "INSERT INTO kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    params![key, value],
                )?;
            }
            BatchOp::Remove { key } => {
                tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            }
        }
    }
    Ok(())
}

/// In-memory store.
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent write fails without changing anything.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the stored keys in order.
    pub fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn write_batch(&self, ops: &[BatchOp]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        apply_to_map(&mut values, ops);
        Ok(())
    }

    fn update(&self, keys: &[&str], edit: &mut UpdateFn<'_>) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        let current: Vec<Option<String>> = keys.iter().map(|k| values.get(*k).cloned()).collect();
        let ops = edit(&current)?;
        if ops.is_empty() {
            return Ok(());
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        apply_to_map(&mut values, &ops);
        Ok(())
    }
}

fn simulated_failure() -> Error {
    Error::Io(std::io::Error::other("simulated write failure"))
}

fn apply_to_map(values: &mut BTreeMap<String, String>, ops: &[BatchOp]) {
    for op in ops {
        match op {
            BatchOp::Set { key, value } => {
                values.insert(key.clone(), value.clone());
            }
            BatchOp::Remove { key } => {
                values.remove(key);
            }
        }
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
