// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is request/response:
//! - Client sends an [`ApiRequest`] carrying a client-chosen `id`
//! - Server answers with an [`ApiResponse`] echoing that `id`
//!
//! Both are JSON objects with a `type` tag, e.g.
//! `{"id":7,"type":"list_transactions","limit":100}`.

use serde::{Deserialize, Serialize};

use crate::record::{Alert, Category, NewTransaction, Reminder, Transaction};

/// Calls a client can make.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiCall {
    /// Create a transaction; answered with [`ApiReply::Transaction`].
    CreateTransaction { transaction: NewTransaction },

    /// List the most recent transactions, newest first.
    ListTransactions { limit: usize },

    ListCategories,

    ListAlerts,

    ListReminders,

    /// Keepalive / reachability check.
    Ping,
}

/// Replies a server can send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiReply {
    Transaction { transaction: Transaction },
    Transactions { items: Vec<Transaction> },
    Categories { items: Vec<Category> },
    Alerts { items: Vec<Alert> },
    Reminders { items: Vec<Reminder> },
    Pong,
    /// The call failed on the server.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

/// A call tagged with a client-chosen correlation id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiRequest {
    pub id: u64,
    #[serde(flatten)]
    pub call: ApiCall,
}

/// A reply correlated to the request with the same id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub id: u64,
    #[serde(flatten)]
    pub reply: ApiReply,
}

impl ApiRequest {
    pub fn new(id: u64, call: ApiCall) -> Self {
        ApiRequest { id, call }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ApiResponse {
    pub fn new(id: u64, reply: ApiReply) -> Self {
        ApiResponse { id, reply }
    }

    /// Creates an Error reply.
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        ApiResponse {
            id,
            reply: ApiReply::Error {
                message: message.into(),
            },
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
