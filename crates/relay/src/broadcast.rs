// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort delivery to one connection or to a whole room.
//!
//! Sends never fail outward: a peer that is no longer open is skipped and the
//! remaining recipients still get the frame. Dead peers are left for the
//! heartbeat sweep.

use crate::protocol::{encode, ServerMessage};
use crate::registry::{Connection, Registry};

/// Send `msg` to a single connection. Returns whether the peer accepted it.
pub fn send_to(conn: &Connection, msg: &ServerMessage) -> bool {
    deliver(conn, encode(msg))
}

/// Send `msg` to every member of `room` except `exclude`.
///
/// Returns the number of peers that accepted the frame.
pub fn broadcast(
    registry: &Registry,
    room: &str,
    msg: &ServerMessage,
    exclude: Option<&str>,
) -> usize {
    let frame = encode(msg);
    registry
        .all_matching(|c| c.in_room(room) && exclude != Some(c.id.as_str()))
        .into_iter()
        .filter(|c| deliver(c, frame.clone()))
        .count()
}

fn deliver(conn: &Connection, frame: String) -> bool {
    if !conn.peer.is_open() {
        tracing::debug!(conn_id = %conn.id, "skipping send to closed peer");
        return false;
    }
    match conn.peer.send(frame) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(conn_id = %conn.id, err = %e, "send failed");
            false
        }
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
