// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Full-data backups.
//!
//! A backup is a self-contained snapshot of all four collections. The
//! artifact and its timestamp are written in one storage batch, so a failed
//! write leaves the previous backup in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_core::clock::monotonic;
use tally_core::storage::read_json;
use tally_core::{BackupArtifact, BackupData, BatchOp, Clock, KeyValueStore, Result};

const BACKUP_KEY: &str = "backup.latest";
pub(crate) const BACKUP_TIME_KEY: &str = "backup.time";

pub struct BackupService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl BackupService {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        BackupService { store, clock }
    }

    /// Persist `data` as the current backup and record its time.
    pub fn create_backup(&self, data: BackupData) -> Result<BackupArtifact> {
        let created_at = monotonic(self.backup_time()?, self.clock.now());
        let artifact = BackupArtifact::new(created_at, data);

        self.store.write_batch(&[
            BatchOp::set_json(BACKUP_KEY, &artifact)?,
            BatchOp::set_json(BACKUP_TIME_KEY, &created_at)?,
        ])?;

        tracing::info!(
            records = artifact.record_count(),
            created_at = %created_at,
            "backup written"
        );
        Ok(artifact)
    }

    pub fn backup_time(&self) -> Result<Option<DateTime<Utc>>> {
        read_json(self.store.as_ref(), BACKUP_TIME_KEY)
    }

    /// The most recent backup, if any.
    pub fn latest(&self) -> Result<Option<BackupArtifact>> {
        read_json(self.store.as_ref(), BACKUP_KEY)
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
