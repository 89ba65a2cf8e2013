// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::dispatch::{self, DispatchLimits};
use crate::error::RegistryError;
use crate::heartbeat::{self, SweepReport};
use crate::peer::PeerHandle;
use crate::protocol::RoomCount;
use crate::registry::{next_connection_id, ConnectionId, Registry};
use crate::rooms;

/// Shared relay state.
///
/// Every transport event takes the registry lock for the full transition, so
/// no two events ever interleave. The lock is never held across an await.
pub struct RelayState {
    pub registry: Mutex<Registry>,
    pub config: RelayConfig,
    pub shutdown: CancellationToken,
}

impl RelayState {
    pub fn new(config: RelayConfig, shutdown: CancellationToken) -> Self {
        Self { registry: Mutex::new(Registry::new()), config, shutdown }
    }

    /// Register a new session and return its id.
    pub fn open(&self, peer: PeerHandle) -> Result<ConnectionId, RegistryError> {
        let id = next_connection_id();
        dispatch::open(&mut self.registry.lock(), id.clone(), peer)?;
        Ok(id)
    }

    /// Handle one inbound frame from `id`.
    pub fn on_frame(&self, id: &str, frame: &[u8]) {
        dispatch::handle_frame(&mut self.registry.lock(), id, frame, self.limits());
    }

    /// Transport reported the session closed. Safe to call more than once.
    pub fn on_close(&self, id: &str) {
        dispatch::disconnect(&mut self.registry.lock(), id);
    }

    /// Liveness probe acknowledged.
    pub fn on_probe_ack(&self, id: &str) {
        if let Some(conn) = self.registry.lock().find_mut(id) {
            conn.alive = true;
        }
    }

    /// Run one heartbeat cycle.
    pub fn sweep(&self) -> SweepReport {
        heartbeat::sweep(&mut self.registry.lock())
    }

    pub fn connection_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn room_summary(&self) -> Vec<RoomCount> {
        rooms::room_summary(&self.registry.lock())
    }

    fn limits(&self) -> DispatchLimits {
        DispatchLimits { max_message_chars: self.config.max_message_chars }
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
