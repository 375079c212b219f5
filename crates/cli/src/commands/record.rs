// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use chrono::Utc;
use serde_json::json;
use tally_core::{Amount, NewTransaction, TransactionKind};

use crate::cli::OutputFormat;
use crate::display::format_transaction;
use crate::error::{Error, Result};
use crate::sync::RecordOutcome;

use super::{runtime, Access, Context};

pub fn run(
    state_dir: &Path,
    kind: TransactionKind,
    amount: Amount,
    category: String,
    description: String,
    output: OutputFormat,
) -> Result<()> {
    let tx = NewTransaction::new(kind, amount, category, description, Utc::now());

    // Another process holding the lock may be mid-pass; queue behind it.
    let outcome = match Context::open(state_dir, Access::Exclusive) {
        Ok(ctx) => {
            let coordinator = ctx.coordinator;
            runtime()?.block_on(async {
                coordinator.check_connectivity().await;
                coordinator.record_transaction(tx).await
            })?
        }
        Err(Error::LockHeld(path)) => {
            tracing::debug!(lock = %path, "state locked, queueing");
            let ctx = Context::open(state_dir, Access::Shared)?;
            RecordOutcome::Queued(ctx.coordinator.queue_transaction(tx)?)
        }
        Err(e) => return Err(e),
    };

    match (output, &outcome) {
        (OutputFormat::Text, RecordOutcome::Submitted(created)) => {
            println!("Recorded {}", format_transaction(created));
        }
        (OutputFormat::Text, RecordOutcome::Queued(local_id)) => {
            println!("Queued {} (will sync when online)", local_id);
        }
        (OutputFormat::Json, RecordOutcome::Submitted(created)) => {
            let value = json!({"status": "submitted", "transaction": created});
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        (OutputFormat::Json, RecordOutcome::Queued(local_id)) => {
            let value = json!({"status": "queued", "local_id": local_id});
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
