// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! One task per connection. Each text frame is an `ApiRequest`; each gets
//! exactly one `ApiResponse` echoing its id.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use tally_core::{ApiCall, ApiReply, ApiRequest, ApiResponse};

use crate::state::ServerState;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);
    serve(listener, state).await?;
    Ok(())
}

/// Accept connections on an already-bound listener.
pub(crate) async fn serve(listener: TcpListener, state: ServerState) -> std::io::Result<()> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = handle_text(&text, &state).await;
                ws_sink.send(Message::text(response.to_json()?)).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Ok(_) => {
                // Ignore other message types (Binary, Pong, Frame)
            }
            Err(e) => {
                warn!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Parse a frame and answer it. Unparseable frames get an error reply with id 0.
pub(crate) async fn handle_text(text: &str, state: &ServerState) -> ApiResponse {
    match ApiRequest::from_json(text) {
        Ok(request) => {
            let id = request.id;
            match handle_call(request.call, state).await {
                Ok(reply) => ApiResponse::new(id, reply),
                Err(message) => ApiResponse::error(id, message),
            }
        }
        Err(e) => {
            debug!("Rejected malformed request: {}", e);
            ApiResponse::error(0, format!("malformed request: {}", e))
        }
    }
}

async fn handle_call(call: ApiCall, state: &ServerState) -> Result<ApiReply, String> {
    debug!("Received call: {:?}", call);

    let reply = match call {
        ApiCall::CreateTransaction { transaction } => {
            let transaction = state
                .create_transaction(transaction)
                .await
                .map_err(|e| e.to_string())?;
            info!(id = %transaction.id, "transaction created");
            ApiReply::Transaction { transaction }
        }
        ApiCall::ListTransactions { limit } => ApiReply::Transactions {
            items: state.list_transactions(limit).await,
        },
        ApiCall::ListCategories => ApiReply::Categories {
            items: state.list_categories().await,
        },
        ApiCall::ListAlerts => ApiReply::Alerts {
            items: state.list_alerts().await,
        },
        ApiCall::ListReminders => ApiReply::Reminders {
            items: state.list_reminders().await,
        },
        ApiCall::Ping => ApiReply::Pong,
    };
    Ok(reply)
}
