// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground sync loop.
//!
//! Runs a foreground check at start, then polls connectivity and lets the
//! coordinator auto-sync on every restoration until Ctrl-C.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::display::format_time;
use crate::error::Result;

use super::{runtime, Access, Context};

pub fn run(state_dir: &Path) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Exclusive)?;
    let coordinator = ctx.coordinator;
    let interval = ctx.config.poll_interval();
    let remote_url = ctx.config.remote_url();

    runtime()?.block_on(async move {
        let cancel = CancellationToken::new();
        let mut status_rx = coordinator.subscribe();

        let watcher = coordinator.spawn_connectivity_watch(cancel.clone());
        match coordinator.on_app_foreground().await {
            Ok(outcome) => tracing::info!(?outcome, "initial sync check"),
            Err(e) => tracing::warn!(error = %e, "initial sync failed"),
        }
        let poller = coordinator.monitor().spawn_polling(interval, cancel.clone());

        println!(
            "Watching {} (every {}s, Ctrl-C to stop)",
            remote_url,
            interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = status_rx.borrow_and_update().clone();
                    println!(
                        "{}: {} pending, last sync {}",
                        status.state(),
                        status.pending_count,
                        format_time(status.last_sync_time)
                    );
                }
            }
        }

        cancel.cancel();
        let _ = watcher.await;
        let _ = poller.await;
        tracing::info!("watch stopped");
    });
    Ok(())
}
