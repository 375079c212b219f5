// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote API abstraction.
//!
//! Provides a trait-based API layer that enables:
//! - A real WebSocket client for production
//! - Scripted mock backends for unit testing
//!
//! Only success and failure are interpreted by callers; there are no
//! special status codes.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use tally_core::{
    Alert, ApiCall, ApiReply, ApiRequest, ApiResponse, Category, NewTransaction, Reminder,
    Transaction,
};

/// Error type for remote API calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// Could not reach the server.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// The call did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Send or receive failed on an open connection.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with an error reply.
    #[error("server error: {0}")]
    Server(String),

    /// The server answered with a reply of the wrong kind.
    #[error("unexpected reply to {call}: {reply}")]
    UnexpectedReply { call: String, reply: String },

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for remote API calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`RemoteApi`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// The backend consumed by the sync subsystem.
///
/// Implementations are responsible for their own timeouts: a call must
/// fail rather than hang.
pub trait RemoteApi: Send + Sync {
    /// `transactions.create(data)`
    fn create_transaction(&self, tx: NewTransaction) -> RemoteFuture<'_, Transaction>;

    /// `transactions.list({limit})`
    fn list_transactions(&self, limit: usize) -> RemoteFuture<'_, Vec<Transaction>>;

    /// `categories.list()`
    fn list_categories(&self) -> RemoteFuture<'_, Vec<Category>>;

    /// `alerts.list()`
    fn list_alerts(&self) -> RemoteFuture<'_, Vec<Alert>>;

    /// `reminders.list()`
    fn list_reminders(&self) -> RemoteFuture<'_, Vec<Reminder>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// Remote API client speaking JSON request/response over one WebSocket.
///
/// The connection is opened lazily on the first call and dropped after any
/// failure, so the next call reconnects. Calls are serialized on the
/// connection.
pub struct WebSocketRemote {
    url: String,
    timeout: Duration,
    conn: Mutex<Option<WebSocketConnection>>,
    next_id: AtomicU64,
}

impl WebSocketRemote {
    /// Create a client for `url` with a per-call timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        WebSocketRemote {
            url: url.into(),
            timeout,
            conn: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// The server URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a ping and wait for the pong.
    pub async fn ping(&self) -> RemoteResult<()> {
        match self.call(ApiCall::Ping).await? {
            ApiReply::Pong => Ok(()),
            other => Err(unexpected("ping", &other)),
        }
    }

    /// Perform one call under the configured timeout.
    async fn call(&self, call: ApiCall) -> RemoteResult<ApiReply> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = ApiRequest::new(id, call);
        let mut guard = self.conn.lock().await;

        let result = tokio::time::timeout(self.timeout, exchange(&self.url, &mut guard, &request))
            .await
            .unwrap_or(Err(RemoteError::Timeout(self.timeout)));

        if result.is_err() {
            // The connection may be half-used; start fresh next time
            *guard = None;
        }

        match result? {
            ApiReply::Error { message } => Err(RemoteError::Server(message)),
            reply => Ok(reply),
        }
    }
}

/// Connect if needed, send the request, and wait for its response.
async fn exchange(
    url: &str,
    conn: &mut Option<WebSocketConnection>,
    request: &ApiRequest,
) -> RemoteResult<ApiReply> {
    if conn.is_none() {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| RemoteError::ConnectionFailed(e.to_string()))?;
        let (sink, stream) = ws_stream.split();
        *conn = Some(WebSocketConnection { sink, stream });
    }
    let ws = conn.as_mut().ok_or(RemoteError::ConnectionClosed)?;

    let json = request
        .to_json()
        .map_err(|e| RemoteError::Serialization(e.to_string()))?;
    ws.sink
        .send(Message::text(json))
        .await
        .map_err(|e| RemoteError::Transport(e.to_string()))?;

    loop {
        match ws.stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let response = ApiResponse::from_json(&text)
                    .map_err(|e| RemoteError::Serialization(e.to_string()))?;
                if response.id == request.id {
                    return Ok(response.reply);
                }
                // Stale reply from an earlier, timed-out call
                tracing::debug!(id = response.id, "discarding stale response");
            }
            Some(Ok(Message::Close(_))) | None => return Err(RemoteError::ConnectionClosed),
            Some(Ok(_)) => {
                // Ignore ping/pong and binary frames
                continue;
            }
            Some(Err(e)) => return Err(RemoteError::Transport(e.to_string())),
        }
    }
}

fn call_name(reply: &ApiReply) -> &'static str {
    match reply {
        ApiReply::Transaction { .. } => "transaction",
        ApiReply::Transactions { .. } => "transactions",
        ApiReply::Categories { .. } => "categories",
        ApiReply::Alerts { .. } => "alerts",
        ApiReply::Reminders { .. } => "reminders",
        ApiReply::Pong => "pong",
        ApiReply::Error { .. } => "error",
    }
}

fn unexpected(call: &str, reply: &ApiReply) -> RemoteError {
    RemoteError::UnexpectedReply {
        call: call.to_string(),
        reply: call_name(reply).to_string(),
    }
}

impl RemoteApi for WebSocketRemote {
    fn create_transaction(&self, tx: NewTransaction) -> RemoteFuture<'_, Transaction> {
        Box::pin(async move {
            match self
                .call(ApiCall::CreateTransaction { transaction: tx })
                .await?
            {
                ApiReply::Transaction { transaction } => Ok(transaction),
                other => Err(unexpected("create_transaction", &other)),
            }
        })
    }

    fn list_transactions(&self, limit: usize) -> RemoteFuture<'_, Vec<Transaction>> {
        Box::pin(async move {
            match self.call(ApiCall::ListTransactions { limit }).await? {
                ApiReply::Transactions { items } => Ok(items),
                other => Err(unexpected("list_transactions", &other)),
            }
        })
    }

    fn list_categories(&self) -> RemoteFuture<'_, Vec<Category>> {
        Box::pin(async move {
            match self.call(ApiCall::ListCategories).await? {
                ApiReply::Categories { items } => Ok(items),
                other => Err(unexpected("list_categories", &other)),
            }
        })
    }

    fn list_alerts(&self) -> RemoteFuture<'_, Vec<Alert>> {
        Box::pin(async move {
            match self.call(ApiCall::ListAlerts).await? {
                ApiReply::Alerts { items } => Ok(items),
                other => Err(unexpected("list_alerts", &other)),
            }
        })
    }

    fn list_reminders(&self) -> RemoteFuture<'_, Vec<Reminder>> {
        Box::pin(async move {
            match self.call(ApiCall::ListReminders).await? {
                ApiReply::Reminders { items } => Ok(items),
                other => Err(unexpected("list_reminders", &other)),
            }
        })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
