// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live connection registry: the only record of room membership.

use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::peer::PeerHandle;

/// Name a connection carries until it supplies one on join.
pub const DEFAULT_NAME: &str = "Anonymous";

/// Process-unique connection identifier.
pub type ConnectionId = String;

/// Allocate a fresh connection id. UUIDv4, so ids are never reused.
pub fn next_connection_id() -> ConnectionId {
    uuid::Uuid::new_v4().to_string()
}

/// One live client session and its mutable attributes.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    pub room: Option<String>,
    pub alive: bool,
    pub peer: PeerHandle,
    pub connected_at: u64,
}

impl Connection {
    pub fn new(id: ConnectionId, peer: PeerHandle, connected_at: u64) -> Self {
        Self { id, name: DEFAULT_NAME.to_owned(), room: None, alive: true, peer, connected_at }
    }

    /// Milliseconds since the connection opened, as of `now`.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.connected_at)
    }

    pub fn in_room(&self, room: &str) -> bool {
        self.room.as_deref() == Some(room)
    }
}

/// Connections keyed by id, in insertion order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: IndexMap<ConnectionId, Connection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conn: Connection) -> Result<(), RegistryError> {
        if self.entries.contains_key(&conn.id) {
            return Err(RegistryError::DuplicateId(conn.id));
        }
        self.entries.insert(conn.id.clone(), conn);
        Ok(())
    }

    /// Remove and return the entry. Absent ids yield `None` (double close).
    pub fn remove(&mut self, id: &str) -> Option<Connection> {
        self.entries.shift_remove(id)
    }

    pub fn find(&self, id: &str) -> Option<&Connection> {
        self.entries.get(id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Connection> {
        self.entries.get_mut(id)
    }

    pub fn all_matching<F>(&self, predicate: F) -> Vec<&Connection>
    where
        F: Fn(&Connection) -> bool,
    {
        self.entries.values().filter(|c| predicate(c)).collect()
    }

    /// Point-in-time copy of all ids, safe to iterate while mutating.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
