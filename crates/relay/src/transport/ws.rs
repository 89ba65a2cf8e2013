// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket endpoint: one task per client bridging the socket and the relay.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use crate::peer::{Outbound, PeerHandle};
use crate::state::RelayState;

/// `GET /ws`: WebSocket upgrade for a relay client.
pub async fn ws_handler(
    State(state): State<Arc<RelayState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let limit = state.config.max_frame_bytes;
    ws.max_message_size(limit).on_upgrade(move |socket| handle_connection(state, socket))
}

/// Per-connection event loop.
async fn handle_connection(state: Arc<RelayState>, socket: WebSocket) {
    let (peer, mut outbound) = PeerHandle::channel();
    let terminated = peer.terminated();
    let id = match state.open(peer) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(err = %e, "rejecting connection");
            return;
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = terminated.cancelled() => break,
            _ = state.shutdown.cancelled() => break,

            // Relay -> client.
            item = outbound.recv() => {
                let Some(item) = item else { break };
                let msg = match item {
                    Outbound::Frame(text) => Message::Text(text.into()),
                    Outbound::Probe => Message::Ping(Bytes::new()),
                };
                if let Err(e) = ws_tx.send(msg).await {
                    tracing::debug!(conn_id = %id, err = %e, "ws send failed");
                    break;
                }
            }

            // Client -> relay.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => state.on_frame(&id, text.as_str().as_bytes()),
                    Some(Ok(Message::Binary(data))) => state.on_frame(&id, &data),
                    Some(Ok(Message::Pong(_))) => state.on_probe_ack(&id),
                    Some(Ok(Message::Ping(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(conn_id = %id, err = %e, "ws receive failed");
                        break;
                    }
                }
            }
        }
    }

    state.on_close(&id);
    let _ = ws_tx.send(Message::Close(None)).await;
}
