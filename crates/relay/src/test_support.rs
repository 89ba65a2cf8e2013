// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for unit and integration tests.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::peer::{Outbound, PeerHandle};
use crate::registry::{Connection, Registry};
use crate::state::RelayState;

/// Register a bare connection (no greeting) and return its outbound receiver.
pub fn attach(
    registry: &mut Registry,
    id: &str,
) -> anyhow::Result<mpsc::UnboundedReceiver<Outbound>> {
    let (peer, rx) = PeerHandle::channel();
    registry.add(Connection::new(id.to_owned(), peer, 0))?;
    Ok(rx)
}

/// Force a connection's room without going through a join.
pub fn set_room(registry: &mut Registry, id: &str, room: &str) {
    if let Some(conn) = registry.find_mut(id) {
        conn.room = Some(room.to_owned());
    }
}

/// Pull everything currently queued for a peer.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

/// Pull queued frames as JSON, skipping probes.
pub fn drain_frames(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<serde_json::Value> {
    drain(rx)
        .into_iter()
        .filter_map(|item| match item {
            Outbound::Frame(text) => serde_json::from_str(&text).ok(),
            Outbound::Probe => None,
        })
        .collect()
}

/// Serialize a JSON value into an inbound frame.
pub fn frame(value: serde_json::Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Config suitable for in-process servers: ephemeral port, slow heartbeat.
pub fn test_config() -> RelayConfig {
    RelayConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        heartbeat_ms: 60_000,
        max_frame_bytes: 65_536,
        max_message_chars: 2000,
        log_format: "text".to_owned(),
        log_level: "info".to_owned(),
    }
}

pub fn test_state() -> Arc<RelayState> {
    Arc::new(RelayState::new(test_config(), CancellationToken::new()))
}

/// Spawn the relay router on a random local port.
pub async fn spawn_http_server(
    state: Arc<RelayState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}

/// Assert that an expression returns `Err` whose `Display` contains a substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
