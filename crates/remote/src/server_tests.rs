// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server and state tests.
//!
//! Provides a TestServer that runs on a random port over a temp data
//! directory.

#![cfg(test)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use tally_core::{
    jsonl, Amount, ApiCall, ApiReply, ApiRequest, ApiResponse, Category, NewTransaction,
    TransactionKind,
};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::server;
use crate::state::ServerState;

fn new_tx(description: &str, minutes: i64) -> NewTransaction {
    let base = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
    NewTransaction::new(
        TransactionKind::Expense,
        Amount::from_minor(500),
        "cat-food",
        description,
        base + ChronoDuration::minutes(minutes),
    )
}

/// A test server that runs on a random port.
struct TestServer {
    url: String,
    state: ServerState,
    handle: tokio::task::JoinHandle<()>,
    _temp_dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = ServerState::open(temp_dir.path()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let serve_state = state.clone();
        let handle = tokio::spawn(async move {
            let _ = server::serve(listener, serve_state).await;
        });

        TestServer {
            url,
            state,
            handle,
            _temp_dir: temp_dir,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn roundtrip(url: &str, frames: Vec<String>) -> Vec<ApiResponse> {
    let (mut ws, _) = connect_async(url).await.unwrap();
    let mut replies = Vec::new();
    for frame in frames {
        ws.send(Message::text(frame)).await.unwrap();
        loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => {
                    replies.push(ApiResponse::from_json(&text).unwrap());
                    break;
                }
                _ => continue,
            }
        }
    }
    replies
}

fn request(id: u64, call: ApiCall) -> String {
    ApiRequest::new(id, call).to_json().unwrap()
}

// State

#[tokio::test]
async fn test_ids_are_sequential() {
    let temp = tempfile::tempdir().unwrap();
    let state = ServerState::open(temp.path()).unwrap();

    let a = state.create_transaction(new_tx("a", 0)).await.unwrap();
    let b = state.create_transaction(new_tx("b", 1)).await.unwrap();
    assert_eq!(a.id, "txn-1");
    assert_eq!(b.id, "txn-2");
}

#[tokio::test]
async fn test_non_positive_amount_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let state = ServerState::open(temp.path()).unwrap();

    let mut tx = new_tx("free", 0);
    tx.amount = Amount::ZERO;
    let err = state.create_transaction(tx).await.unwrap_err();
    assert!(err.to_string().contains("amount must be positive"));
    assert!(state.list_transactions(10).await.is_empty());
}

#[tokio::test]
async fn test_transactions_survive_reopen_and_ids_continue() {
    let temp = tempfile::tempdir().unwrap();
    {
        let state = ServerState::open(temp.path()).unwrap();
        state.create_transaction(new_tx("a", 0)).await.unwrap();
        state.create_transaction(new_tx("b", 1)).await.unwrap();
    }

    let state = ServerState::open(temp.path()).unwrap();
    assert_eq!(state.list_transactions(10).await.len(), 2);
    let c = state.create_transaction(new_tx("c", 2)).await.unwrap();
    assert_eq!(c.id, "txn-3");
}

#[tokio::test]
async fn test_list_is_newest_first_and_limited() {
    let temp = tempfile::tempdir().unwrap();
    let state = ServerState::open(temp.path()).unwrap();
    state.create_transaction(new_tx("old", 0)).await.unwrap();
    state.create_transaction(new_tx("newest", 10)).await.unwrap();
    state.create_transaction(new_tx("middle", 5)).await.unwrap();

    let items = state.list_transactions(2).await;
    let descriptions: Vec<&str> = items.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["newest", "middle"]);
}

#[tokio::test]
async fn test_collections_load_from_files() {
    let temp = tempfile::tempdir().unwrap();
    let categories = vec![Category {
        id: "cat-food".to_string(),
        name: "Food".to_string(),
        kind: TransactionKind::Expense,
    }];
    jsonl::write_all(&temp.path().join("categories.jsonl"), &categories).unwrap();

    let state = ServerState::open(temp.path()).unwrap();
    assert_eq!(state.list_categories().await, categories);
    assert!(state.list_alerts().await.is_empty());
    assert!(state.list_reminders().await.is_empty());
}

// Protocol

#[tokio::test]
async fn test_create_and_list_over_websocket() {
    let server = TestServer::start().await;
    let replies = roundtrip(
        &server.url,
        vec![
            request(
                7,
                ApiCall::CreateTransaction {
                    transaction: new_tx("coffee", 0),
                },
            ),
            request(8, ApiCall::ListTransactions { limit: 100 }),
        ],
    )
    .await;

    assert_eq!(replies[0].id, 7);
    match &replies[0].reply {
        ApiReply::Transaction { transaction } => assert_eq!(transaction.id, "txn-1"),
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(replies[1].id, 8);
    match &replies[1].reply {
        ApiReply::Transactions { items } => assert_eq!(items.len(), 1),
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(server.state.list_transactions(10).await.len(), 1);
}

#[tokio::test]
async fn test_rejected_create_gets_error_reply() {
    let server = TestServer::start().await;
    let mut tx = new_tx("refund", 0);
    tx.amount = Amount::from_minor(-100);

    let replies = roundtrip(
        &server.url,
        vec![request(3, ApiCall::CreateTransaction { transaction: tx })],
    )
    .await;
    assert_eq!(replies[0].id, 3);
    assert!(matches!(replies[0].reply, ApiReply::Error { .. }));
}

#[tokio::test]
async fn test_malformed_frame_gets_error_with_id_zero() {
    let server = TestServer::start().await;
    let replies = roundtrip(
        &server.url,
        vec![
            "not json".to_string(),
            request(2, ApiCall::Ping),
        ],
    )
    .await;

    assert_eq!(replies[0].id, 0);
    assert!(matches!(replies[0].reply, ApiReply::Error { .. }));
    // Connection stays usable
    assert_eq!(replies[1], ApiResponse::new(2, ApiReply::Pong));
}

#[tokio::test]
async fn test_reference_lists_over_websocket() {
    let server = TestServer::start().await;
    let replies = roundtrip(
        &server.url,
        vec![
            request(1, ApiCall::ListCategories),
            request(2, ApiCall::ListAlerts),
            request(3, ApiCall::ListReminders),
        ],
    )
    .await;

    assert!(matches!(&replies[0].reply, ApiReply::Categories { items } if items.is_empty()));
    assert!(matches!(&replies[1].reply, ApiReply::Alerts { items } if items.is_empty()));
    assert!(matches!(&replies[2].reply, ApiReply::Reminders { items } if items.is_empty()));
}
