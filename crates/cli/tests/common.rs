// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use futures_util::{SinkExt, StreamExt};
use tally_core::{ApiCall, ApiReply, ApiRequest, ApiResponse, Category, Transaction};
use tokio_tungstenite::tungstenite::Message;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn tally() -> Command {
    cargo_bin_cmd!("tally")
}

/// `tally` bound to a state directory.
pub fn tally_in(state: &TempDir) -> Command {
    let mut cmd = tally();
    cmd.env_remove("TALLY_REMOTE_URL")
        .env_remove("TALLY_STATE_DIR")
        .arg("--state-dir")
        .arg(state.path());
    cmd
}

/// A URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("ws://127.0.0.1:{port}")
}

/// Rewrite the config with test-friendly timings.
fn speed_up(dir: &Path) {
    let path = dir.join("config.toml");
    let content = std::fs::read_to_string(&path).unwrap();
    let mut config: toml::Table = toml::from_str(&content).unwrap();
    let remote = config.get_mut("remote").unwrap().as_table_mut().unwrap();
    remote.insert("probe_timeout_ms".into(), toml::Value::Integer(300));
    remote.insert("request_timeout_ms".into(), toml::Value::Integer(2000));
    let sync = config.get_mut("sync").unwrap().as_table_mut().unwrap();
    sync.insert("debounce_ms".into(), toml::Value::Integer(0));
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
}

/// Initialize a state directory pointing at `url`.
pub fn init_with(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    tally_in(&temp)
        .arg("init")
        .arg("--remote")
        .arg(url)
        .assert()
        .success();
    speed_up(temp.path());
    temp
}

/// Initialize a state directory whose server is unreachable.
pub fn init_offline() -> TempDir {
    init_with(&unreachable_url())
}

/// Record an expense and return the stdout.
pub fn record(state: &TempDir, amount: &str, description: &str) -> String {
    let output = tally_in(state)
        .args(["record", "expense", amount, "--category", "cat-food"])
        .args(["--description", description])
        .output()
        .unwrap();
    assert!(output.status.success(), "record failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Extract the `pend-...` id from record output.
pub fn queued_id(stdout: &str) -> String {
    stdout
        .split_whitespace()
        .find(|s| s.starts_with("pend-"))
        .unwrap()
        .to_string()
}

/// Minimal in-process sync server for black-box tests.
///
/// Runs on its own thread and runtime so it outlives each `tally`
/// invocation. Stops when dropped.
pub struct TestServer {
    pub url: String,
    pub transactions: Arc<Mutex<Vec<Transaction>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl TestServer {
    pub fn start(categories: Vec<Category>) -> Self {
        let transactions = Arc::new(Mutex::new(Vec::new()));
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let store = Arc::clone(&transactions);
        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let accept = async {
                    while let Ok((stream, _)) = listener.accept().await {
                        let store = Arc::clone(&store);
                        let categories = categories.clone();
                        tokio::spawn(serve(stream, store, categories));
                    }
                };
                tokio::select! {
                    _ = accept => {}
                    _ = shutdown_rx => {}
                }
            });
        });

        TestServer {
            url,
            transactions,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    pub fn created(&self) -> Vec<String> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.description.clone())
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn serve(
    stream: tokio::net::TcpStream,
    store: Arc<Mutex<Vec<Transaction>>>,
    categories: Vec<Category>,
) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = ws.split();
    while let Some(Ok(msg)) = source.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let request = ApiRequest::from_json(&text).unwrap();
        let reply = match request.call {
            ApiCall::CreateTransaction { transaction } => {
                let mut items = store.lock().unwrap();
                let created = Transaction::from_new(format!("txn-{}", items.len() + 1), transaction);
                items.push(created.clone());
                ApiReply::Transaction {
                    transaction: created,
                }
            }
            ApiCall::ListTransactions { limit } => {
                let items = store.lock().unwrap();
                ApiReply::Transactions {
                    items: items.iter().rev().take(limit).cloned().collect(),
                }
            }
            ApiCall::ListCategories => ApiReply::Categories {
                items: categories.clone(),
            },
            ApiCall::ListAlerts => ApiReply::Alerts { items: vec![] },
            ApiCall::ListReminders => ApiReply::Reminders { items: vec![] },
            ApiCall::Ping => ApiReply::Pong,
        };
        let json = ApiResponse::new(request.id, reply).to_json().unwrap();
        if sink.send(Message::text(json)).await.is_err() {
            break;
        }
    }
}
