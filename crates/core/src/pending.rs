// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locally-created operations awaiting server acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::record::{NewTransaction, TransactionKind};

/// A transaction recorded locally that the server has not acknowledged yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Locally-generated opaque identifier.
    pub local_id: String,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Number of failed submission attempts so far.
    #[serde(default)]
    pub retry_count: u32,
}

impl PendingTransaction {
    /// Wraps a create request under a local id with no failed attempts.
    pub fn new(local_id: impl Into<String>, tx: NewTransaction) -> Self {
        PendingTransaction {
            local_id: local_id.into(),
            kind: tx.kind,
            amount: tx.amount,
            category_id: tx.category_id,
            description: tx.description,
            created_at: tx.created_at,
            retry_count: 0,
        }
    }

    /// Returns the create request to submit to the server.
    pub fn to_new_transaction(&self) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            amount: self.amount,
            category_id: self.category_id.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
        }
    }
}

/// A pending transaction that was given up on, kept so the loss is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub transaction: PendingTransaction,
    pub reason: String,
    pub dropped_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
