// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::cli::OutputFormat;
use crate::display::format_pending;
use crate::error::{Error, Result};

use super::{print_list, Access, Context};

const DISCARD_REASON: &str = "discarded by user";

pub fn run(state_dir: &Path, discard: Option<String>, output: OutputFormat) -> Result<()> {
    match discard {
        Some(local_id) => run_discard(state_dir, &local_id),
        None => run_list(state_dir, output),
    }
}

fn run_list(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Shared)?;
    let pending = ctx.coordinator.queue().list()?;
    print_list(&pending, output, "No pending transactions.", |op| {
        vec![format_pending(op)]
    })
}

fn run_discard(state_dir: &Path, local_id: &str) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Exclusive)?;
    ctx.coordinator
        .queue()
        .discard(local_id, DISCARD_REASON)?
        .ok_or_else(|| Error::PendingNotFound(local_id.to_string()))?;
    println!("Discarded {} (moved to dead letters)", local_id);
    Ok(())
}
