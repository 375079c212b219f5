// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Each collection lives in memory and in `<data>/<collection>.jsonl`.
//! Transactions are appended as they are created; the other collections
//! are read at startup and edited out of band.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use tally_core::{jsonl, Alert, Category, NewTransaction, Reminder, Result, Transaction};

const TRANSACTIONS_FILE: &str = "transactions.jsonl";
const CATEGORIES_FILE: &str = "categories.jsonl";
const ALERTS_FILE: &str = "alerts.jsonl";
const REMINDERS_FILE: &str = "reminders.jsonl";
const ID_PREFIX: &str = "txn-";

/// Shared server state.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    transactions_path: PathBuf,
    data: Mutex<Collections>,
}

struct Collections {
    /// In creation order.
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    alerts: Vec<Alert>,
    reminders: Vec<Reminder>,
    next_id: u64,
}

/// Numeric part of a `txn-<n>` id.
fn id_number(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}

impl ServerState {
    /// Loads every collection from `data_dir`, creating it if needed.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let transactions: Vec<Transaction> = jsonl::read_all(&data_dir.join(TRANSACTIONS_FILE))?;
        let next_id = transactions
            .iter()
            .filter_map(|t| id_number(&t.id))
            .max()
            .map_or(1, |n| n + 1);

        let collections = Collections {
            transactions,
            categories: jsonl::read_all(&data_dir.join(CATEGORIES_FILE))?,
            alerts: jsonl::read_all(&data_dir.join(ALERTS_FILE))?,
            reminders: jsonl::read_all(&data_dir.join(REMINDERS_FILE))?,
            next_id,
        };
        tracing::info!(
            transactions = collections.transactions.len(),
            categories = collections.categories.len(),
            alerts = collections.alerts.len(),
            reminders = collections.reminders.len(),
            "loaded state"
        );

        Ok(ServerState {
            inner: Arc::new(ServerStateInner {
                transactions_path: data_dir.join(TRANSACTIONS_FILE),
                data: Mutex::new(collections),
            }),
        })
    }

    /// Validates, assigns the next `txn-<n>` id, and persists.
    pub async fn create_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        new.validate()?;

        let mut data = self.inner.data.lock().await;
        let transaction = Transaction::from_new(format!("{}{}", ID_PREFIX, data.next_id), new);
        jsonl::append(&self.inner.transactions_path, &transaction)?;
        data.next_id += 1;
        data.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// Newest first by `created_at`, later creations first on ties.
    pub async fn list_transactions(&self, limit: usize) -> Vec<Transaction> {
        let data = self.inner.data.lock().await;
        let mut items: Vec<Transaction> = data.transactions.iter().rev().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit);
        items
    }

    pub async fn list_categories(&self) -> Vec<Category> {
        self.inner.data.lock().await.categories.clone()
    }

    pub async fn list_alerts(&self) -> Vec<Alert> {
        self.inner.data.lock().await.alerts.clone()
    }

    pub async fn list_reminders(&self) -> Vec<Reminder> {
        self.inner.data.lock().await.reminders.clone()
    }
}
