// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync state machine.
//!
//! [`SyncCoordinator`] is the only writer of [`SyncStatus`]. Every trigger
//! (manual sync, auto-sync toggle, offline mode toggle, app foreground,
//! connectivity transitions) funnels into one of its entry points, and at
//! most one pass runs at a time.
//!
//! A pass:
//! 1. snapshots the pending queue,
//! 2. submits each entry in FIFO order, removing it on success and bumping
//!    or dead-lettering it on failure,
//! 3. refreshes the four cached collections concurrently,
//! 4. stamps the last sync time,
//! 5. republishes status.
//!
//! An error aborts the rest of the pass without rolling back what already
//! happened. Connectivity loss mid-pass does not cancel it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tally_core::{
    BackupArtifact, BackupData, NewTransaction, PendingTransaction, SyncState, SyncStatus,
    Transaction,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::backup::BackupService;
use super::cache::{Collection, DataCache};
use super::connectivity::ConnectivityMonitor;
use super::queue::{PendingOperationStore, QueueError};
use super::remote::{RemoteApi, RemoteError};
use crate::id::generate_unique_local_id;

/// Errors surfaced by the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("network unavailable\n  hint: check your connection, or leave offline mode with 'tally offline off'")]
    NetworkUnavailable,

    /// A single queued create failed. Handled by retry bookkeeping.
    #[error("failed to submit {local_id}: {source}")]
    RemoteOperationFailed {
        local_id: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to refresh {collection}: {source}")]
    RefreshFailed {
        collection: Collection,
        #[source]
        source: RemoteError,
    },

    #[error("backup failed fetching {collection}: {source}")]
    BackupFailed {
        collection: Collection,
        #[source]
        source: RemoteError,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Core(#[from] tally_core::Error),
}

/// Result type for coordinator operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// What one completed pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Queued entries accepted by the server.
    pub submitted: usize,
    /// Entries that failed and stay queued with a higher retry count.
    pub retried: usize,
    /// Entries that exhausted their retries and were dead-lettered.
    pub dropped: usize,
    /// Records fetched into the cache.
    pub refreshed: usize,
}

/// Why a trigger did not start a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    AutoSyncDisabled,
    NothingPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another pass was in flight; this request did nothing.
    AlreadyRunning,
    Skipped(SkipReason),
}

/// Result of recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Accepted by the server directly.
    Submitted(Transaction),
    /// Stored in the pending queue under this local id.
    Queued(String),
}

/// Tunables for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Auto-sync value used until the user toggles it.
    pub auto_sync: bool,
    /// Delay between connectivity restoration and the auto-sync pass.
    pub debounce: Duration,
    /// Transactions fetched per refresh.
    pub page_size: usize,
    /// Transactions fetched per backup.
    pub backup_page_size: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        CoordinatorSettings {
            auto_sync: true,
            debounce: Duration::from_millis(2000),
            page_size: 100,
            backup_page_size: 1000,
        }
    }
}

/// The collaborators a coordinator drives.
pub struct SyncComponents {
    pub remote: Arc<dyn RemoteApi>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub queue: Arc<PendingOperationStore>,
    pub cache: Arc<DataCache>,
    pub backups: Arc<BackupService>,
}

/// Holds the in-progress flag for the duration of a pass.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncCoordinator {
    remote: Arc<dyn RemoteApi>,
    monitor: Arc<ConnectivityMonitor>,
    queue: Arc<PendingOperationStore>,
    cache: Arc<DataCache>,
    backups: Arc<BackupService>,
    settings: CoordinatorSettings,
    auto_sync: AtomicBool,
    offline_mode: AtomicBool,
    syncing: AtomicBool,
    last_error: Mutex<Option<String>>,
    status_tx: watch::Sender<SyncStatus>,
}

impl SyncCoordinator {
    /// Build a coordinator, loading persisted preferences from the cache.
    pub fn new(components: SyncComponents, settings: CoordinatorSettings) -> SyncResult<Self> {
        let auto_sync = components
            .cache
            .auto_sync()?
            .unwrap_or(settings.auto_sync);
        let offline_mode = components.cache.offline_mode()?;
        let (status_tx, _) = watch::channel(SyncStatus::default());

        let coordinator = SyncCoordinator {
            remote: components.remote,
            monitor: components.monitor,
            queue: components.queue,
            cache: components.cache,
            backups: components.backups,
            settings,
            auto_sync: AtomicBool::new(auto_sync),
            offline_mode: AtomicBool::new(offline_mode),
            syncing: AtomicBool::new(false),
            last_error: Mutex::new(None),
            status_tx,
        };
        coordinator.publish_status();
        Ok(coordinator)
    }

    /// Receive the current status and every later change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status_tx.borrow().clone()
    }

    pub fn state(&self) -> SyncState {
        self.status().state()
    }

    /// Online according to the monitor and not forced offline.
    pub fn is_online(&self) -> bool {
        !self.offline_mode.load(Ordering::Acquire) && self.monitor.get_is_online()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    pub fn auto_sync_enabled(&self) -> bool {
        self.auto_sync.load(Ordering::Acquire)
    }

    pub fn offline_mode_enabled(&self) -> bool {
        self.offline_mode.load(Ordering::Acquire)
    }

    pub fn queue(&self) -> &Arc<PendingOperationStore> {
        &self.queue
    }

    pub fn cache(&self) -> &Arc<DataCache> {
        &self.cache
    }

    pub fn backups(&self) -> &Arc<BackupService> {
        &self.backups
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    /// User-requested sync. Refused while offline.
    pub async fn handle_manual_sync(&self) -> SyncResult<SyncOutcome> {
        if !self.is_online() {
            tracing::info!("manual sync refused: offline");
            return Err(SyncError::NetworkUnavailable);
        }
        self.run_pass().await
    }

    /// Alias of [`handle_manual_sync`](Self::handle_manual_sync).
    pub async fn on_manual_sync_requested(&self) -> SyncResult<SyncOutcome> {
        self.handle_manual_sync().await
    }

    /// Connectivity came back: after the debounce, auto-sync if enabled and
    /// anything is pending.
    pub async fn on_connectivity_restored(&self) -> SyncResult<SyncOutcome> {
        self.publish_status();
        if !self.settings.debounce.is_zero() {
            tokio::time::sleep(self.settings.debounce).await;
        }
        self.auto_sync_pass().await
    }

    /// Connectivity went away. A running pass is left to finish.
    pub fn on_connectivity_lost(&self) {
        self.publish_status();
    }

    /// Re-probe connectivity and republish status without syncing.
    pub async fn check_connectivity(&self) -> bool {
        self.monitor.check_network_status().await;
        self.publish_status();
        self.is_online()
    }

    /// Re-probe connectivity and auto-sync if there is work.
    pub async fn on_app_foreground(&self) -> SyncResult<SyncOutcome> {
        self.monitor.check_network_status().await;
        self.publish_status();
        self.auto_sync_pass().await
    }

    /// Persist the auto-sync preference. Enabling it starts a pass at once
    /// when online with work pending.
    pub async fn toggle_auto_sync(&self, enabled: bool) -> SyncResult<SyncOutcome> {
        self.cache.set_auto_sync(enabled)?;
        self.auto_sync.store(enabled, Ordering::Release);
        tracing::info!(enabled, "auto-sync toggled");
        self.publish_status();

        if !enabled {
            return Ok(SyncOutcome::Skipped(SkipReason::AutoSyncDisabled));
        }
        self.auto_sync_pass().await
    }

    /// Persist the offline-mode preference. Leaving offline mode is
    /// handled like a connectivity restoration.
    pub async fn toggle_offline_mode(&self, enabled: bool) -> SyncResult<SyncOutcome> {
        self.cache.set_offline_mode(enabled)?;
        self.offline_mode.store(enabled, Ordering::Release);
        tracing::info!(enabled, "offline mode toggled");

        if enabled {
            self.publish_status();
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }
        self.monitor.check_network_status().await;
        self.on_connectivity_restored().await
    }

    /// Record a new transaction: submit it directly when online and idle,
    /// otherwise queue it.
    pub async fn record_transaction(&self, tx: NewTransaction) -> SyncResult<RecordOutcome> {
        tx.validate()?;

        if self.is_online() && !self.is_syncing() {
            match self.remote.create_transaction(tx.clone()).await {
                Ok(created) => {
                    tracing::info!(id = %created.id, "transaction submitted");
                    return Ok(RecordOutcome::Submitted(created));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "direct submit failed, queueing");
                }
            }
        }

        let local_id = self.queue_transaction(tx)?;
        Ok(RecordOutcome::Queued(local_id))
    }

    /// Put a transaction in the pending queue without contacting the
    /// server. Returns its local id.
    pub fn queue_transaction(&self, tx: NewTransaction) -> SyncResult<String> {
        tx.validate()?;
        let existing: HashSet<String> = self
            .queue
            .list()?
            .into_iter()
            .map(|p| p.local_id)
            .collect();
        let local_id =
            generate_unique_local_id(&tx.description, &tx.created_at, |id| existing.contains(id));

        self.queue
            .enqueue(PendingTransaction::new(local_id.clone(), tx))?;
        tracing::info!(%local_id, "transaction queued");
        self.publish_status();
        Ok(local_id)
    }

    /// Fetch every collection and store it as the current backup.
    ///
    /// Nothing is written unless all four fetches succeed.
    pub async fn create_backup(&self) -> SyncResult<BackupArtifact> {
        if !self.is_online() {
            return Err(SyncError::NetworkUnavailable);
        }

        let (transactions, categories, alerts, reminders) = tokio::join!(
            self.remote
                .list_transactions(self.settings.backup_page_size),
            self.remote.list_categories(),
            self.remote.list_alerts(),
            self.remote.list_reminders(),
        );
        let data = BackupData {
            transactions: transactions.map_err(backup_failed(Collection::Transactions))?,
            categories: categories.map_err(backup_failed(Collection::Categories))?,
            alerts: alerts.map_err(backup_failed(Collection::Alerts))?,
            reminders: reminders.map_err(backup_failed(Collection::Reminders))?,
        };

        let artifact = self.backups.create_backup(data)?;
        self.publish_status();
        Ok(artifact)
    }

    /// Forward monitor transitions to the coordinator until `cancel` fires.
    pub fn spawn_connectivity_watch(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = self.monitor.add_connectivity_listener(move |online| {
            let _ = tx.send(online);
        });
        let coordinator = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(true) => match coordinator.on_connectivity_restored().await {
                            Ok(outcome) => tracing::debug!(?outcome, "auto-sync after reconnect"),
                            Err(e) => tracing::warn!(error = %e, "auto-sync after reconnect failed"),
                        },
                        Some(false) => coordinator.on_connectivity_lost(),
                        None => break,
                    }
                }
            }
            handle.unsubscribe();
        })
    }

    async fn auto_sync_pass(&self) -> SyncResult<SyncOutcome> {
        if !self.is_online() {
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }
        if !self.auto_sync_enabled() {
            return Ok(SyncOutcome::Skipped(SkipReason::AutoSyncDisabled));
        }
        if self.queue.count()? == 0 {
            return Ok(SyncOutcome::Skipped(SkipReason::NothingPending));
        }
        self.run_pass().await
    }

    async fn run_pass(&self) -> SyncResult<SyncOutcome> {
        let Some(guard) = PassGuard::acquire(&self.syncing) else {
            tracing::debug!("sync already running");
            return Ok(SyncOutcome::AlreadyRunning);
        };
        self.publish_status();
        tracing::info!("sync pass started");

        let result = self.drain_and_refresh().await;

        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) =
            result.as_ref().err().map(|e| e.to_string());
        drop(guard);
        self.publish_status();

        match &result {
            Ok(report) => tracing::info!(
                submitted = report.submitted,
                retried = report.retried,
                dropped = report.dropped,
                refreshed = report.refreshed,
                "sync pass complete"
            ),
            Err(e) => tracing::warn!(error = %e, "sync pass failed"),
        }
        result.map(SyncOutcome::Completed)
    }

    async fn drain_and_refresh(&self) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();

        for op in self.queue.list()? {
            match self.remote.create_transaction(op.to_new_transaction()).await {
                Ok(created) => {
                    self.queue.remove(&op.local_id)?;
                    tracing::debug!(local_id = %op.local_id, id = %created.id, "submitted");
                    report.submitted += 1;
                }
                Err(source) => {
                    let failure = SyncError::RemoteOperationFailed {
                        local_id: op.local_id.clone(),
                        source,
                    };
                    if self.queue.should_retry(&op) {
                        let retry_count = op.retry_count.saturating_add(1);
                        self.queue.update_retry_count(&op.local_id, retry_count)?;
                        tracing::debug!(error = %failure, retry_count, "will retry");
                        report.retried += 1;
                    } else {
                        tracing::warn!(error = %failure, "retries exhausted, dead-lettering");
                        self.queue.discard(&op.local_id, &failure.to_string())?;
                        report.dropped += 1;
                    }
                }
            }
            self.publish_status();
        }

        report.refreshed = self.refresh().await?;
        self.cache.update_last_sync_time()?;
        Ok(report)
    }

    /// Fetch all four collections concurrently and replace each cached
    /// snapshot that came back. Returns the number of records fetched.
    async fn refresh(&self) -> SyncResult<usize> {
        let (transactions, categories, alerts, reminders) = tokio::join!(
            self.remote.list_transactions(self.settings.page_size),
            self.remote.list_categories(),
            self.remote.list_alerts(),
            self.remote.list_reminders(),
        );
        let mut fetched = 0;

        // Successful collections are stored even if another one failed
        if let Ok(items) = &transactions {
            self.cache.cache_transactions(items)?;
            fetched += items.len();
        }
        if let Ok(items) = &categories {
            self.cache.cache_categories(items)?;
            fetched += items.len();
        }
        if let Ok(items) = &alerts {
            self.cache.cache_alerts(items)?;
            fetched += items.len();
        }
        if let Ok(items) = &reminders {
            self.cache.cache_reminders(items)?;
            fetched += items.len();
        }

        transactions.map_err(refresh_failed(Collection::Transactions))?;
        categories.map_err(refresh_failed(Collection::Categories))?;
        alerts.map_err(refresh_failed(Collection::Alerts))?;
        reminders.map_err(refresh_failed(Collection::Reminders))?;
        Ok(fetched)
    }

    /// Recompute status from the stores and publish it if it changed.
    fn publish_status(&self) {
        let mut status = self.status_tx.borrow().clone();
        status.is_online = self.is_online();
        status.is_syncing = self.is_syncing();

        match self.queue.count() {
            Ok(count) => status.pending_count = count,
            Err(e) => tracing::warn!(error = %e, "could not read pending count"),
        }
        match self.queue.dead_letter_count() {
            Ok(count) => status.dead_letter_count = count,
            Err(e) => tracing::warn!(error = %e, "could not read dead letters"),
        }
        match self.cache.last_sync_time() {
            Ok(time) => status.last_sync_time = time,
            Err(e) => tracing::warn!(error = %e, "could not read last sync time"),
        }
        status.last_error = self
            .last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

fn refresh_failed(collection: Collection) -> impl FnOnce(RemoteError) -> SyncError {
    move |source| SyncError::RefreshFailed { collection, source }
}

fn backup_failed(collection: Collection) -> impl FnOnce(RemoteError) -> SyncError {
    move |source| SyncError::BackupFailed { collection, source }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
