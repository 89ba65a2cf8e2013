// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background liveness sweep for all registered connections.
//!
//! Each cycle marks every connection not-alive and probes it; a pong flips
//! the flag back. A connection still marked not-alive at the next cycle never
//! answered and is evicted, which gives at most one missed period of grace.

use std::sync::Arc;

use crate::dispatch::disconnect;
use crate::registry::Registry;
use crate::state::RelayState;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub probed: usize,
    pub evicted: usize,
}

/// Probe live connections and evict the ones that missed the last probe.
pub fn sweep(registry: &mut Registry) -> SweepReport {
    let mut report = SweepReport::default();

    // Ids are snapshotted so evictions cannot disturb the walk.
    for id in registry.ids() {
        let Some(conn) = registry.find_mut(&id) else {
            continue;
        };

        if !conn.alive {
            tracing::info!(conn_id = %id, "evicting unresponsive connection");
            conn.peer.terminate();
            disconnect(registry, &id);
            report.evicted += 1;
            continue;
        }

        conn.alive = false;
        if let Err(e) = conn.peer.probe() {
            tracing::debug!(conn_id = %id, err = %e, "probe failed");
        }
        report.probed += 1;
    }

    report
}

/// Spawn the periodic sweep task. Stops when the shutdown token fires.
pub fn spawn_heartbeat(state: Arc<RelayState>) -> tokio::task::JoinHandle<()> {
    let period = state.config.heartbeat_interval();

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; nothing to probe yet.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            let report = state.sweep();
            if report.evicted > 0 {
                tracing::info!(
                    probed = report.probed,
                    evicted = report.evicted,
                    "heartbeat sweep evicted connections"
                );
            } else {
                tracing::trace!(probed = report.probed, "heartbeat sweep");
            }
        }
    })
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
