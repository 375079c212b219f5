// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tally-core: Shared library for the tally finance client
//!
//! This crate provides the data model, money type, durable key-value
//! storage and wire protocol used by both the `tally` client and the
//! `tally-remote` reference server.

pub mod amount;
pub mod backup;
pub mod clock;
pub mod error;
pub mod jsonl;
pub mod pending;
pub mod protocol;
pub mod record;
pub mod status;
pub mod storage;

pub use amount::Amount;
pub use backup::{BackupArtifact, BackupData};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use pending::{DeadLetter, PendingTransaction};
pub use protocol::{ApiCall, ApiReply, ApiRequest, ApiResponse};
pub use record::{Alert, Category, NewTransaction, Record, Reminder, Transaction, TransactionKind};
pub use status::{SyncState, SyncStatus};
pub use storage::{BatchOp, KeyValueStore, MemoryStore, SqliteStore, UpdateFn};
