// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Full-data backup artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Alert, Category, Reminder, Transaction};

/// The four collections making up a full dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupData {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub alerts: Vec<Alert>,
    pub reminders: Vec<Reminder>,
}

/// An immutable snapshot of the full dataset at `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupArtifact {
    pub created_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub alerts: Vec<Alert>,
    pub reminders: Vec<Reminder>,
}

impl BackupArtifact {
    /// Stamps a dataset with its creation time.
    pub fn new(created_at: DateTime<Utc>, data: BackupData) -> Self {
        BackupArtifact {
            created_at,
            transactions: data.transactions,
            categories: data.categories,
            alerts: data.alerts,
            reminders: data.reminders,
        }
    }

    /// Total number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.transactions.len() + self.categories.len() + self.alerts.len() + self.reminders.len()
    }
}
