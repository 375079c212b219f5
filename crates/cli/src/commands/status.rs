// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::cli::OutputFormat;
use crate::display::{format_status, StatusView};
use crate::error::Result;
use crate::sync::SyncCoordinator;

use super::{runtime, Access, Context};

/// Probe the server and gather the status view. Never syncs.
pub async fn collect(coordinator: &SyncCoordinator) -> Result<StatusView> {
    coordinator.check_connectivity().await;
    let status = coordinator.status();
    Ok(StatusView {
        state: status.state(),
        status,
        auto_sync: coordinator.auto_sync_enabled(),
        offline_mode: coordinator.offline_mode_enabled(),
        last_backup_time: coordinator.backups().backup_time()?,
    })
}

pub fn run(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Shared)?;
    let view = runtime()?.block_on(collect(&ctx.coordinator))?;

    match output {
        OutputFormat::Text => {
            for line in format_status(&view) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
    }
    Ok(())
}
