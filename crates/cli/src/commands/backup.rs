// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;
use std::path::{Path, PathBuf};

use tally_core::BackupArtifact;

use crate::display::format_backup_summary;
use crate::error::{Error, Result};

use super::{runtime, Access, Context};

pub fn run(state_dir: &Path, file: Option<PathBuf>, show: bool) -> Result<()> {
    if show {
        return run_show(state_dir, file.as_deref());
    }

    let ctx = Context::open(state_dir, Access::Exclusive)?;
    let coordinator = ctx.coordinator;
    let artifact = runtime()?.block_on(async {
        coordinator.check_connectivity().await;
        coordinator.create_backup().await
    })?;

    println!("{}", format_backup_summary(&artifact));
    if let Some(path) = file {
        export(&artifact, &path)?;
        println!("Written to {}", path.display());
    }
    Ok(())
}

/// Print the latest backup as JSON, or write it to `file`.
fn run_show(state_dir: &Path, file: Option<&Path>) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Shared)?;
    let artifact = ctx.coordinator.backups().latest()?.ok_or(Error::NoBackup)?;

    match file {
        Some(path) => {
            export(&artifact, path)?;
            println!("{}", format_backup_summary(&artifact));
            println!("Written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&artifact)?),
    }
    Ok(())
}

fn export(artifact: &BackupArtifact, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact)?;
    fs::write(path, content)?;
    Ok(())
}
