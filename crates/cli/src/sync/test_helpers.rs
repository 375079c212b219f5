// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tally_core::{
    Alert, Amount, Category, ManualClock, MemoryStore, NewTransaction, PendingTransaction,
    Reminder, Transaction, TransactionKind,
};

use super::connectivity::Probe;
use super::remote::{RemoteApi, RemoteError, RemoteFuture};

/// A fixed instant used as "now" in tests.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(fixed_time()))
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Create an expense with the given description.
pub fn make_new_tx(description: &str) -> NewTransaction {
    NewTransaction::new(
        TransactionKind::Expense,
        Amount::from_minor(1250),
        "cat-food",
        description,
        fixed_time(),
    )
}

/// Create a pending entry whose description matches its local id.
pub fn make_pending(local_id: &str) -> PendingTransaction {
    PendingTransaction::new(local_id, make_new_tx(local_id))
}

pub fn make_category(id: &str) -> Category {
    Category {
        id: id.to_string(),
        name: format!("Category {id}"),
        kind: TransactionKind::Expense,
    }
}

pub fn make_transaction(id: &str) -> Transaction {
    Transaction::from_new(id, make_new_tx(id))
}

pub fn make_alert(id: &str) -> Alert {
    Alert {
        id: id.to_string(),
        category_id: Some("cat-food".to_string()),
        threshold: Amount::from_minor(50_000),
        message: "Food budget exceeded".to_string(),
        enabled: true,
    }
}

pub fn make_reminder(id: &str) -> Reminder {
    Reminder {
        id: id.to_string(),
        title: "Rent".to_string(),
        amount: Some(Amount::from_minor(120_000)),
        due_date: fixed_time(),
        done: false,
    }
}

/// Probe whose answer is set by the test.
#[derive(Default)]
pub struct ScriptedProbe {
    online: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(ScriptedProbe {
            online: AtomicBool::new(online),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Probe for ScriptedProbe {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.online.load(Ordering::SeqCst)
        })
    }
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    alerts: Vec<Alert>,
    reminders: Vec<Reminder>,
    /// Creates whose description is listed here fail.
    failing_descriptions: HashSet<String>,
    failing_collections: HashSet<&'static str>,
    fail_all_creates: bool,
    calls: HashMap<&'static str, usize>,
}

/// In-memory backend with scripted failures and call counters.
#[derive(Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
    delay: Mutex<Duration>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(MockRemote::default())
    }

    /// Make every call sleep before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fail_create_for(&self, description: &str) {
        let mut state = self.state.lock().unwrap();
        state.failing_descriptions.insert(description.to_string());
    }

    pub fn fail_all_creates(&self, fail: bool) {
        self.state.lock().unwrap().fail_all_creates = fail;
    }

    /// Make `list_<collection>` fail.
    pub fn fail_list(&self, collection: &'static str) {
        let mut state = self.state.lock().unwrap();
        state.failing_collections.insert(collection);
    }

    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_descriptions.clear();
        state.failing_collections.clear();
        state.fail_all_creates = false;
    }

    pub fn seed_transactions(&self, items: Vec<Transaction>) {
        self.state.lock().unwrap().transactions = items;
    }

    pub fn seed_categories(&self, items: Vec<Category>) {
        self.state.lock().unwrap().categories = items;
    }

    pub fn seed_alerts(&self, items: Vec<Alert>) {
        self.state.lock().unwrap().alerts = items;
    }

    pub fn seed_reminders(&self, items: Vec<Reminder>) {
        self.state.lock().unwrap().reminders = items;
    }

    /// Number of calls made to the named method.
    pub fn calls(&self, method: &'static str) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.get(method).copied().unwrap_or(0)
    }

    /// Descriptions of transactions the server accepted, in order.
    pub fn created_descriptions(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .transactions
            .iter()
            .filter(|t| t.id.starts_with("srv-"))
            .map(|t| t.description.clone())
            .collect()
    }

    async fn enter(&self, method: &'static str) -> Result<(), RemoteError> {
        {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(method).or_insert(0) += 1;
        }
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock().unwrap();
        let collection = method.trim_start_matches("list_");
        if method.starts_with("list_") && state.failing_collections.contains(collection) {
            return Err(RemoteError::Server(format!("{collection} unavailable")));
        }
        Ok(())
    }
}

impl RemoteApi for MockRemote {
    fn create_transaction(&self, tx: NewTransaction) -> RemoteFuture<'_, Transaction> {
        Box::pin(async move {
            self.enter("create_transaction").await?;
            let mut state = self.state.lock().unwrap();
            if state.fail_all_creates || state.failing_descriptions.contains(&tx.description) {
                return Err(RemoteError::ConnectionClosed);
            }
            state.next_id += 1;
            let created = Transaction::from_new(format!("srv-{}", state.next_id), tx);
            state.transactions.push(created.clone());
            Ok(created)
        })
    }

    fn list_transactions(&self, limit: usize) -> RemoteFuture<'_, Vec<Transaction>> {
        Box::pin(async move {
            self.enter("list_transactions").await?;
            let state = self.state.lock().unwrap();
            Ok(state.transactions.iter().rev().take(limit).cloned().collect())
        })
    }

    fn list_categories(&self) -> RemoteFuture<'_, Vec<Category>> {
        Box::pin(async move {
            self.enter("list_categories").await?;
            Ok(self.state.lock().unwrap().categories.clone())
        })
    }

    fn list_alerts(&self) -> RemoteFuture<'_, Vec<Alert>> {
        Box::pin(async move {
            self.enter("list_alerts").await?;
            Ok(self.state.lock().unwrap().alerts.clone())
        })
    }

    fn list_reminders(&self) -> RemoteFuture<'_, Vec<Reminder>> {
        Box::pin(async move {
            self.enter("list_reminders").await?;
            Ok(self.state.lock().unwrap().reminders.clone())
        })
    }
}

/// Serve `api` over WebSocket on a random local port until `cancel` fires.
///
/// Returns the `ws://` URL.
pub async fn spawn_ws_server(
    api: Arc<dyn RemoteApi>,
    cancel: tokio_util::sync::CancellationToken,
) -> String {
    use futures_util::{SinkExt, StreamExt};
    use tally_core::{ApiCall, ApiReply, ApiRequest, ApiResponse};
    use tokio_tungstenite::tungstenite::Message;

    async fn dispatch(api: &dyn RemoteApi, call: ApiCall) -> Result<ApiReply, RemoteError> {
        Ok(match call {
            ApiCall::CreateTransaction { transaction } => ApiReply::Transaction {
                transaction: api.create_transaction(transaction).await?,
            },
            ApiCall::ListTransactions { limit } => ApiReply::Transactions {
                items: api.list_transactions(limit).await?,
            },
            ApiCall::ListCategories => ApiReply::Categories {
                items: api.list_categories().await?,
            },
            ApiCall::ListAlerts => ApiReply::Alerts {
                items: api.list_alerts().await?,
            },
            ApiCall::ListReminders => ApiReply::Reminders {
                items: api.list_reminders().await?,
            },
            ApiCall::Ping => ApiReply::Pong,
        })
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        loop {
            let stream = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => stream,
                    Err(_) => break,
                },
            };
            let api = Arc::clone(&api);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut sink, mut stream) = ws.split();
                loop {
                    let text = tokio::select! {
                        _ = cancel.cancelled() => break,
                        msg = stream.next() => match msg {
                            Some(Ok(Message::Text(text))) => text,
                            Some(Ok(_)) => continue,
                            _ => break,
                        },
                    };
                    let request = ApiRequest::from_json(&text).unwrap();
                    let response = match dispatch(api.as_ref(), request.call).await {
                        Ok(reply) => ApiResponse::new(request.id, reply),
                        Err(e) => ApiResponse::error(request.id, e.to_string()),
                    };
                    let json = response.to_json().unwrap();
                    if sink.send(Message::text(json)).await.is_err() {
                        break;
                    }
                }
                let _ = sink.close().await;
            });
        }
    });

    url
}
