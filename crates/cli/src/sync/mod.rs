// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync and backup.
//!
//! # Architecture
//!
//! ```text
//!  triggers (manual sync, toggles, foreground)
//!        │
//!        ▼
//! ┌──────────────────┐      ┌─────────────┐      ┌─────────────┐
//! │ SyncCoordinator  │─────►│  RemoteApi  │─────►│   Remote    │
//! │ (status: watch)  │◄─────│   (trait)   │◄─────│   Server    │
//! └──────────────────┘      └─────────────┘      └─────────────┘
//!   ▲     │      │
//!   │     ▼      ▼
//!   │  ┌───────────────────┐  ┌───────────┐  ┌───────────────┐
//!   │  │ PendingOperation- │  │ DataCache │  │ BackupService │
//!   │  │ Store (FIFO)      │  │           │  │               │
//!   │  └───────────────────┘  └───────────┘  └───────────────┘
//!   │
//! ┌─────────────────────┐
//! │ ConnectivityMonitor │
//! └─────────────────────┘
//! ```
//!
//! The stores share one [`KeyValueStore`](tally_core::KeyValueStore).

mod backup;
mod cache;
mod connectivity;
mod coordinator;
mod queue;
mod remote;

pub use backup::BackupService;
pub use cache::{Collection, DataCache};
pub use connectivity::{ConnectivityMonitor, ListenerHandle, Probe, ProbeError, TcpProbe};
pub use coordinator::{
    CoordinatorSettings, RecordOutcome, SkipReason, SyncComponents, SyncCoordinator, SyncError,
    SyncOutcome, SyncReport, SyncResult,
};
pub use queue::{
    OverflowPolicy, PendingOperationStore, QueueError, QueueLimits, QueueResult, MAX_RETRIES,
};
pub use remote::{RemoteApi, RemoteError, RemoteFuture, RemoteResult, WebSocketRemote};

#[cfg(test)]
pub(crate) mod test_helpers;
