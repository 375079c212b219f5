// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of transaction creates that have not reached the server.
//!
//! The queue lives in the key-value store as JSONL text under a single key:
//! one [`PendingTransaction`] per line, in enqueue order. Every mutation
//! is a single atomic read-modify-write of the store. Entries that exhaust
//! their retries, or are evicted by the capacity policy, move to a
//! dead-letter list instead of vanishing.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tally_core::{jsonl, BatchOp, Clock, DeadLetter, KeyValueStore, PendingTransaction};

/// Storage key of the pending queue.
pub(crate) const PENDING_KEY: &str = "pending.transactions";

/// Storage key of the dead-letter list.
pub(crate) const DEAD_LETTER_KEY: &str = "pending.dead_letters";

/// Number of failed submissions after which an entry stops being retried.
pub const MAX_RETRIES: u32 = 3;

const EVICTED_REASON: &str = "evicted: queue full";

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue is at capacity and the policy rejects new entries.
    #[error("pending queue is full ({0} entries)\n  hint: sync, or clear entries with 'tally pending --discard'")]
    QueueFull(usize),

    /// An entry with this local id is already queued.
    #[error("pending transaction already queued: {0}")]
    Duplicate(String),

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] tally_core::Error),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// What to do when an enqueue would exceed `max_pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Refuse the new entry.
    #[default]
    Reject,
    /// Move the oldest entry to the dead-letter list.
    DropOldest,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(OverflowPolicy::Reject),
            "drop_oldest" | "drop-oldest" => Ok(OverflowPolicy::DropOldest),
            other => Err(format!(
                "unknown overflow policy '{other}' (expected reject or drop_oldest)"
            )),
        }
    }
}

/// Retry and capacity limits for the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
    pub max_retries: u32,
    /// `None` means unbounded.
    pub max_pending: Option<usize>,
    pub overflow: OverflowPolicy,
}

impl Default for QueueLimits {
    fn default() -> Self {
        QueueLimits {
            max_retries: MAX_RETRIES,
            max_pending: None,
            overflow: OverflowPolicy::Reject,
        }
    }
}

/// Read the queue straight from storage.
pub(crate) fn load_pending(store: &dyn KeyValueStore) -> tally_core::Result<Vec<PendingTransaction>> {
    decode_pending(store.get(PENDING_KEY)?.as_deref())
}

fn decode_pending(text: Option<&str>) -> tally_core::Result<Vec<PendingTransaction>> {
    match text {
        Some(text) => jsonl::decode(text).map_err(|e| tally_core::Error::CorruptedData {
            key: PENDING_KEY.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(Vec::new()),
    }
}

fn decode_dead_letters(text: Option<&str>) -> tally_core::Result<Vec<DeadLetter>> {
    match text {
        Some(text) => {
            serde_json::from_str(text).map_err(|e| tally_core::Error::CorruptedData {
                key: DEAD_LETTER_KEY.to_string(),
                reason: e.to_string(),
            })
        }
        None => Ok(Vec::new()),
    }
}

/// The two lists a queue mutation may edit.
struct Lists {
    pending: Vec<PendingTransaction>,
    dead: Vec<DeadLetter>,
}

/// Durable FIFO of pending transaction creates.
///
/// Mutations are atomic read-modify-write cycles in the store, so several
/// processes may share one queue.
pub struct PendingOperationStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    limits: QueueLimits,
}

impl PendingOperationStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, limits: QueueLimits) -> Self {
        PendingOperationStore {
            store,
            clock,
            limits,
        }
    }

    pub fn limits(&self) -> QueueLimits {
        self.limits
    }

    /// Append an entry at the tail.
    ///
    /// With a capacity limit set, a full queue either rejects the entry or
    /// dead-letters the oldest one, depending on the overflow policy.
    pub fn enqueue(&self, op: PendingTransaction) -> QueueResult<()> {
        let limits = self.limits;
        let now = self.clock.now();
        let local_id = op.local_id.clone();

        self.modify(move |lists| {
            if lists.pending.iter().any(|p| p.local_id == op.local_id) {
                return Err(QueueError::Duplicate(op.local_id));
            }

            let mut evicted = Vec::new();
            if let Some(max) = limits.max_pending {
                match limits.overflow {
                    OverflowPolicy::Reject if lists.pending.len() >= max => {
                        return Err(QueueError::QueueFull(lists.pending.len()));
                    }
                    OverflowPolicy::DropOldest => {
                        // Room for the new entry; a zero limit keeps nothing
                        let keep = max.saturating_sub(1);
                        while lists.pending.len() > keep {
                            evicted.push(lists.pending.remove(0));
                        }
                    }
                    OverflowPolicy::Reject => {}
                }
            }

            if limits.max_pending != Some(0) {
                lists.pending.push(op);
            } else {
                evicted.push(op);
            }

            for entry in evicted {
                tracing::warn!(local_id = %entry.local_id, "evicting pending transaction: queue full");
                lists.dead.push(DeadLetter {
                    transaction: entry,
                    reason: EVICTED_REASON.to_string(),
                    dropped_at: now,
                });
            }
            Ok(())
        })?;

        tracing::debug!(%local_id, "queued pending transaction");
        Ok(())
    }

    /// All pending entries in enqueue order.
    pub fn list(&self) -> QueueResult<Vec<PendingTransaction>> {
        Ok(load_pending(self.store.as_ref())?)
    }

    pub fn get(&self, local_id: &str) -> QueueResult<Option<PendingTransaction>> {
        Ok(self.list()?.into_iter().find(|p| p.local_id == local_id))
    }

    /// Remove an entry. Returns `false` if no entry has this id.
    pub fn remove(&self, local_id: &str) -> QueueResult<bool> {
        self.modify(|lists| {
            let before = lists.pending.len();
            lists.pending.retain(|p| p.local_id != local_id);
            Ok(lists.pending.len() != before)
        })
    }

    /// Set an entry's retry count. Returns `false` if no entry has this id.
    pub fn update_retry_count(&self, local_id: &str, retry_count: u32) -> QueueResult<bool> {
        self.modify(|lists| {
            match lists.pending.iter_mut().find(|p| p.local_id == local_id) {
                Some(entry) => {
                    entry.retry_count = retry_count;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    pub fn count(&self) -> QueueResult<usize> {
        Ok(self.list()?.len())
    }

    /// True while the entry has failed fewer than `max_retries` times.
    pub fn should_retry(&self, op: &PendingTransaction) -> bool {
        op.retry_count < self.limits.max_retries
    }

    /// Drop every pending entry. Dead letters are kept.
    pub fn clear(&self) -> QueueResult<()> {
        self.modify(|lists| {
            lists.pending.clear();
            Ok(())
        })
    }

    /// Move an entry to the dead-letter list in one write.
    ///
    /// Returns the dead letter, or `None` if no entry has this id.
    pub fn discard(&self, local_id: &str, reason: &str) -> QueueResult<Option<DeadLetter>> {
        let now = self.clock.now();
        self.modify(|lists| {
            let Some(pos) = lists.pending.iter().position(|p| p.local_id == local_id) else {
                return Ok(None);
            };
            let letter = DeadLetter {
                transaction: lists.pending.remove(pos),
                reason: reason.to_string(),
                dropped_at: now,
            };
            lists.dead.push(letter.clone());
            Ok(Some(letter))
        })
    }

    pub fn dead_letters(&self) -> QueueResult<Vec<DeadLetter>> {
        Ok(decode_dead_letters(self.store.get(DEAD_LETTER_KEY)?.as_deref())?)
    }

    pub fn dead_letter_count(&self) -> QueueResult<usize> {
        Ok(self.dead_letters()?.len())
    }

    /// Forget all dead letters, returning how many there were.
    pub fn clear_dead_letters(&self) -> QueueResult<usize> {
        self.modify(|lists| {
            let count = lists.dead.len();
            lists.dead.clear();
            Ok(count)
        })
    }

    /// Run `edit` against both lists inside one atomic store update and
    /// write back whichever list changed. Nothing is written if `edit`
    /// fails.
    fn modify<T, F>(&self, edit: F) -> QueueResult<T>
    where
        F: FnOnce(&mut Lists) -> QueueResult<T>,
    {
        let mut edit = Some(edit);
        let mut outcome = None;

        self.store
            .update(&[PENDING_KEY, DEAD_LETTER_KEY], &mut |current| {
                let Some(edit) = edit.take() else {
                    return Ok(Vec::new());
                };
                let pending = decode_pending(current[0].as_deref())?;
                let dead = decode_dead_letters(current[1].as_deref())?;
                let mut lists = Lists {
                    pending: pending.clone(),
                    dead: dead.clone(),
                };

                let result = edit(&mut lists);
                let mut ops = Vec::new();
                if result.is_ok() {
                    if lists.pending != pending {
                        ops.push(BatchOp::set(PENDING_KEY, jsonl::encode(&lists.pending)?));
                    }
                    if lists.dead != dead {
                        ops.push(BatchOp::set_json(DEAD_LETTER_KEY, &lists.dead)?);
                    }
                }
                outcome = Some(result);
                Ok(ops)
            })?;

        match outcome {
            Some(result) => result,
            None => Err(QueueError::Storage(tally_core::Error::Io(std::io::Error::other(
                "queue update did not run",
            )))),
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
