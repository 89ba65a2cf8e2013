// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay: real-time room chat over WebSocket.

pub mod broadcast;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod heartbeat;
pub mod peer;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::heartbeat::spawn_heartbeat;
use crate::state::RelayState;
use crate::transport::build_router;

/// Run the relay server until SIGINT/SIGTERM.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let shutdown = CancellationToken::new();
    let state = Arc::new(RelayState::new(config, shutdown.clone()));

    spawn_signal_handler(shutdown.clone());
    let heartbeat = spawn_heartbeat(Arc::clone(&state));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("relay listening on {}", listener.local_addr()?);

    let router = build_router(state);
    axum::serve(listener, router).with_graceful_shutdown(shutdown.clone().cancelled_owned()).await?;

    shutdown.cancel();
    let _ = heartbeat.await;
    tracing::info!("relay stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGINT");
            }
            _ = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });
}
