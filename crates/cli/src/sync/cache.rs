// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local mirror of server-owned collections.
//!
//! Each collection is stored as a JSON array under `cache.<collection>` and
//! every write replaces the previous snapshot wholesale. Reads return the
//! last successful write; nothing is fetched on a miss.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tally_core::clock::monotonic;
use tally_core::storage::read_json;
use tally_core::{
    Alert, BatchOp, Category, Clock, KeyValueStore, Record, Reminder, Result, Transaction,
};

use super::backup::BACKUP_TIME_KEY;
use super::queue::load_pending;

const TRANSACTIONS_KEY: &str = "cache.transactions";
const CATEGORIES_KEY: &str = "cache.categories";
const ALERTS_KEY: &str = "cache.alerts";
const REMINDERS_KEY: &str = "cache.reminders";
const LAST_SYNC_KEY: &str = "sync.last_sync_time";
const AUTO_SYNC_KEY: &str = "prefs.auto_sync";
const OFFLINE_MODE_KEY: &str = "prefs.offline_mode";

/// The four cached collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Transactions,
    Categories,
    Alerts,
    Reminders,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Transactions,
        Collection::Categories,
        Collection::Alerts,
        Collection::Reminders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Transactions => "transactions",
            Collection::Categories => "categories",
            Collection::Alerts => "alerts",
            Collection::Reminders => "reminders",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Collection::Transactions => TRANSACTIONS_KEY,
            Collection::Categories => CATEGORIES_KEY,
            Collection::Alerts => ALERTS_KEY,
            Collection::Reminders => REMINDERS_KEY,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!("unknown collection '{s}' (expected transactions, categories, alerts or reminders)")
            })
    }
}

pub struct DataCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl DataCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        DataCache { store, clock }
    }

    pub fn cache_transactions(&self, items: &[Transaction]) -> Result<()> {
        self.replace(Collection::Transactions, items)
    }

    pub fn cache_categories(&self, items: &[Category]) -> Result<()> {
        self.replace(Collection::Categories, items)
    }

    pub fn cache_alerts(&self, items: &[Alert]) -> Result<()> {
        self.replace(Collection::Alerts, items)
    }

    pub fn cache_reminders(&self, items: &[Reminder]) -> Result<()> {
        self.replace(Collection::Reminders, items)
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        self.snapshot(Collection::Transactions)
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        self.snapshot(Collection::Categories)
    }

    pub fn alerts(&self) -> Result<Vec<Alert>> {
        self.snapshot(Collection::Alerts)
    }

    pub fn reminders(&self) -> Result<Vec<Reminder>> {
        self.snapshot(Collection::Reminders)
    }

    /// Look up a cached category by id.
    pub fn category(&self, id: &str) -> Result<Option<Category>> {
        Ok(self.categories()?.into_iter().find(|c| c.id() == id))
    }

    /// Number of entries in the pending queue.
    pub fn pending_count(&self) -> Result<usize> {
        Ok(load_pending(self.store.as_ref())?.len())
    }

    pub fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        read_json(self.store.as_ref(), LAST_SYNC_KEY)
    }

    /// Record a completed sync at the current time.
    ///
    /// Never moves the stored time backwards.
    pub fn update_last_sync_time(&self) -> Result<DateTime<Utc>> {
        let time = monotonic(self.last_sync_time()?, self.clock.now());
        self.store
            .write_batch(&[BatchOp::set_json(LAST_SYNC_KEY, &time)?])?;
        Ok(time)
    }

    /// Time of the most recent backup.
    pub fn backup_time(&self) -> Result<Option<DateTime<Utc>>> {
        read_json(self.store.as_ref(), BACKUP_TIME_KEY)
    }

    /// Stored auto-sync preference, if the user ever toggled it.
    pub fn auto_sync(&self) -> Result<Option<bool>> {
        read_json(self.store.as_ref(), AUTO_SYNC_KEY)
    }

    pub fn set_auto_sync(&self, enabled: bool) -> Result<()> {
        self.store
            .write_batch(&[BatchOp::set_json(AUTO_SYNC_KEY, &enabled)?])
    }

    pub fn offline_mode(&self) -> Result<bool> {
        Ok(read_json(self.store.as_ref(), OFFLINE_MODE_KEY)?.unwrap_or(false))
    }

    pub fn set_offline_mode(&self, enabled: bool) -> Result<()> {
        self.store
            .write_batch(&[BatchOp::set_json(OFFLINE_MODE_KEY, &enabled)?])
    }

    fn replace<T: Serialize>(&self, collection: Collection, items: &[T]) -> Result<()> {
        self.store
            .write_batch(&[BatchOp::set_json(collection.key(), items)?])?;
        tracing::debug!(%collection, count = items.len(), "replaced cache snapshot");
        Ok(())
    }

    fn snapshot<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        Ok(read_json(self.store.as_ref(), collection.key())?.unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
