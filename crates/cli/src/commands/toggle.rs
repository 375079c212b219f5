// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tally auto-sync` and `tally offline`.

use std::path::Path;

use crate::cli::Switch;
use crate::display::format_outcome;
use crate::error::Result;
use crate::sync::SyncOutcome;

use super::{runtime, Access, Context};

pub fn run_auto_sync(state_dir: &Path, state: Switch) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Exclusive)?;
    let coordinator = ctx.coordinator;
    let outcome = runtime()?.block_on(async {
        coordinator.check_connectivity().await;
        coordinator.toggle_auto_sync(state.is_on()).await
    })?;

    if state.is_on() {
        println!("Auto-sync enabled");
    } else {
        println!("Auto-sync disabled");
    }
    report(&outcome);
    Ok(())
}

pub fn run_offline(state_dir: &Path, state: Switch) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Exclusive)?;
    let coordinator = ctx.coordinator;
    let outcome = runtime()?.block_on(coordinator.toggle_offline_mode(state.is_on()))?;

    if state.is_on() {
        println!("Offline mode on: new transactions will be queued");
    } else if coordinator.is_online() {
        println!("Offline mode off");
    } else {
        println!("Offline mode off, but the server is unreachable");
    }
    report(&outcome);
    Ok(())
}

/// Mention the pass a toggle triggered, if any.
fn report(outcome: &SyncOutcome) {
    if let SyncOutcome::Completed(_) = outcome {
        println!("{}", format_outcome(outcome));
    }
}
