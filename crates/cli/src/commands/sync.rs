// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use serde_json::json;

use crate::cli::OutputFormat;
use crate::display::format_outcome;
use crate::error::Result;
use crate::sync::{SyncOutcome, SyncResult};

use super::{runtime, Access, Context};

pub fn run(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Exclusive)?;
    let coordinator = ctx.coordinator;

    let outcome: SyncResult<SyncOutcome> = runtime()?.block_on(async {
        coordinator.check_connectivity().await;
        coordinator.handle_manual_sync().await
    });
    let outcome = outcome?;

    match output {
        OutputFormat::Text => println!("{}", format_outcome(&outcome)),
        OutputFormat::Json => {
            let value = match &outcome {
                SyncOutcome::Completed(report) => json!({"status": "completed", "report": report}),
                SyncOutcome::AlreadyRunning => json!({"status": "already_running"}),
                SyncOutcome::Skipped(_) => json!({"status": "skipped"}),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
