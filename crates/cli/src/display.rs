// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_core::{
    Alert, BackupArtifact, Category, DeadLetter, PendingTransaction, Reminder, SyncState,
    SyncStatus, Transaction, TransactionKind,
};

use crate::sync::{SkipReason, SyncOutcome, SyncReport};

/// Format an optional timestamp, or "never".
pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".to_string(),
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Signed amount column: expenses are shown negative.
fn signed_amount(kind: TransactionKind, amount: impl std::fmt::Display) -> String {
    match kind {
        TransactionKind::Income => format!("+{}", amount),
        TransactionKind::Expense => format!("-{}", amount),
    }
}

/// Everything `tally status` reports.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub state: SyncState,
    #[serde(flatten)]
    pub status: SyncStatus,
    pub auto_sync: bool,
    pub offline_mode: bool,
    pub last_backup_time: Option<DateTime<Utc>>,
}

/// Format the status block.
///
/// ```text
/// State:         idle
/// Pending:       2
/// Dead letters:  0
/// Last sync:     2026-03-14 09:26:53 UTC
/// Last backup:   never
/// Auto-sync:     on
/// Offline mode:  off
/// ```
pub fn format_status(view: &StatusView) -> Vec<String> {
    let mut lines = vec![
        format!("State:         {}", view.state),
        format!("Pending:       {}", view.status.pending_count),
        format!("Dead letters:  {}", view.status.dead_letter_count),
        format!("Last sync:     {}", format_time(view.status.last_sync_time)),
        format!("Last backup:   {}", format_time(view.last_backup_time)),
        format!("Auto-sync:     {}", on_off(view.auto_sync)),
        format!("Offline mode:  {}", on_off(view.offline_mode)),
    ];
    if let Some(err) = &view.status.last_error {
        lines.push(format!("Last error:    {}", err));
    }
    lines
}

/// `pend-1a2b3c4d  expense  -12.50  cat-food  lunch  (retries: 1)`
pub fn format_pending(op: &PendingTransaction) -> String {
    let mut line = format!(
        "{}  {}  {}  {}",
        op.local_id,
        op.kind,
        signed_amount(op.kind, op.amount),
        op.category_id
    );
    if !op.description.is_empty() {
        line.push_str("  ");
        line.push_str(&op.description);
    }
    if op.retry_count > 0 {
        line.push_str(&format!("  (retries: {})", op.retry_count));
    }
    line
}

pub fn format_dead_letter(letter: &DeadLetter) -> Vec<String> {
    vec![
        format_pending(&letter.transaction),
        format!(
            "    dropped {}: {}",
            format_time(Some(letter.dropped_at)),
            letter.reason
        ),
    ]
}

pub fn format_transaction(tx: &Transaction) -> String {
    let mut line = format!(
        "{}  {}  {}  {}",
        tx.id,
        tx.created_at.format("%Y-%m-%d"),
        signed_amount(tx.kind, tx.amount),
        tx.category_id
    );
    if !tx.description.is_empty() {
        line.push_str("  ");
        line.push_str(&tx.description);
    }
    line
}

pub fn format_category(category: &Category) -> String {
    format!("{}  {}  ({})", category.id, category.name, category.kind)
}

pub fn format_alert(alert: &Alert) -> String {
    let scope = alert.category_id.as_deref().unwrap_or("all");
    let disabled = if alert.enabled { "" } else { "  [disabled]" };
    format!(
        "{}  {}  over {}: {}{}",
        alert.id, scope, alert.threshold, alert.message, disabled
    )
}

pub fn format_reminder(reminder: &Reminder) -> String {
    let mark = if reminder.done { "[x]" } else { "[ ]" };
    let amount = reminder
        .amount
        .map(|a| format!("  {}", a))
        .unwrap_or_default();
    format!(
        "{} {}  due {}  {}{}",
        mark,
        reminder.id,
        reminder.due_date.format("%Y-%m-%d"),
        reminder.title,
        amount
    )
}

/// Summary line for a completed pass.
pub fn format_report(report: &SyncReport) -> String {
    let mut line = format!(
        "Synced: {} submitted, {} retried, {} dropped, {} records refreshed",
        report.submitted, report.retried, report.dropped, report.refreshed
    );
    if report.dropped > 0 {
        line.push_str("\n  hint: see 'tally dead-letters' for dropped transactions");
    }
    line
}

pub fn format_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Completed(report) => format_report(report),
        SyncOutcome::AlreadyRunning => "A sync is already running.".to_string(),
        SyncOutcome::Skipped(SkipReason::Offline) => "Offline, nothing synced.".to_string(),
        SyncOutcome::Skipped(SkipReason::AutoSyncDisabled) => {
            "Auto-sync is off, nothing synced.".to_string()
        }
        SyncOutcome::Skipped(SkipReason::NothingPending) => "Nothing pending.".to_string(),
    }
}

pub fn format_backup_summary(artifact: &BackupArtifact) -> String {
    format!(
        "Backup {}: {} transactions, {} categories, {} alerts, {} reminders",
        format_time(Some(artifact.created_at)),
        artifact.transactions.len(),
        artifact.categories.len(),
        artifact.alerts.len(),
        artifact.reminders.len()
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
