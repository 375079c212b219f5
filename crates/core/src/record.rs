// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server-authoritative records.
//!
//! These are the collections mirrored by the local cache: transactions,
//! categories, alerts and reminders. Each carries a server-assigned `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::error::{Error, Result};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Anything stored in a cached collection, keyed by its server id.
pub trait Record {
    /// The server-assigned identifier.
    fn id(&self) -> &str;
}

/// Body of a transaction-create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    /// Creates a new transaction body.
    pub fn new(
        kind: TransactionKind,
        amount: Amount,
        category_id: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        NewTransaction {
            kind,
            amount,
            category_id: category_id.into(),
            description: description.into(),
            created_at,
        }
    }

    /// Checks the fields a backend would reject outright.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(Error::InvalidInput(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.category_id.trim().is_empty() {
            return Err(Error::InvalidInput("category is required".to_string()));
        }
        Ok(())
    }
}

/// A transaction acknowledged by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds the server record for a create request.
    pub fn from_new(id: impl Into<String>, new: NewTransaction) -> Self {
        Transaction {
            id: id.into(),
            kind: new.kind,
            amount: new.amount,
            category_id: new.category_id,
            description: new.description,
            created_at: new.created_at,
        }
    }
}

/// A spending or income category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub kind: TransactionKind,
}

/// A budget alert on a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub threshold: Amount,
    pub message: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A payment reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub done: bool,
}

impl Record for Transaction {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Alert {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Reminder {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
