// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request transitions: one decoded frame in, registry mutation plus replies
//! and broadcasts out.
//!
//! Every function here runs to completion with the registry borrowed
//! mutably, so callers get one-transition-at-a-time atomicity by holding the
//! registry lock around the call.

use crate::broadcast::{broadcast, send_to};
use crate::error::{RegistryError, Rejection};
use crate::peer::PeerHandle;
use crate::protocol::{decode, ClientRequest, ServerMessage};
use crate::registry::{Connection, Registry};
use crate::rooms::{members_of, room_summary};
use crate::state::epoch_ms;

/// Greeting sent to every new connection.
pub const GREETING: &str = "Connected";

/// Tunable bounds applied while dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    /// Longest accepted chat message, in chars, after trimming.
    pub max_message_chars: usize,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self { max_message_chars: 2000 }
    }
}

/// Register a new connection and greet it.
pub fn connect(registry: &mut Registry, conn: Connection) -> Result<(), RegistryError> {
    let id = conn.id.clone();
    registry.add(conn)?;
    tracing::info!(conn_id = %id, connections = registry.len(), "connection opened");
    reply(registry, &id, ServerMessage::system(GREETING));
    Ok(())
}

/// Build and register a connection for `peer` under `id`.
pub fn open(
    registry: &mut Registry,
    id: String,
    peer: PeerHandle,
) -> Result<(), RegistryError> {
    connect(registry, Connection::new(id, peer, epoch_ms()))
}

/// Decode one raw frame and apply it. Undecodable frames get one `system` reply.
pub fn handle_frame(registry: &mut Registry, id: &str, frame: &[u8], limits: DispatchLimits) {
    match decode(frame) {
        Ok(req) => dispatch(registry, id, req, limits),
        Err(e) => {
            tracing::debug!(conn_id = %id, err = %e, "undecodable frame");
            reply(registry, id, ServerMessage::rejection(Rejection::InvalidMessage));
        }
    }
}

/// Apply one decoded request on behalf of connection `id`.
pub fn dispatch(registry: &mut Registry, id: &str, req: ClientRequest, limits: DispatchLimits) {
    if registry.find(id).is_none() {
        tracing::debug!(conn_id = %id, kind = req.kind(), "request from unregistered connection");
        return;
    }
    match req {
        ClientRequest::Join { room_id, name } => join(registry, id, &room_id, name.as_deref()),
        ClientRequest::Leave => leave(registry, id),
        ClientRequest::Chat { message } => chat(registry, id, &message, limits),
        ClientRequest::Who => who(registry, id),
        ClientRequest::Rooms => {
            reply(registry, id, ServerMessage::Rooms { rooms: room_summary(registry) });
        }
        ClientRequest::Ping => reply(registry, id, ServerMessage::Pong),
    }
}

/// Remove a connection and tell its room it is gone.
///
/// Unknown ids are a no-op, so a close racing a heartbeat eviction is harmless.
pub fn disconnect(registry: &mut Registry, id: &str) -> Option<Connection> {
    let conn = registry.remove(id)?;
    tracing::info!(
        conn_id = %conn.id,
        room = conn.room.as_deref().unwrap_or("-"),
        age_ms = conn.age_ms(epoch_ms()),
        connections = registry.len(),
        "connection closed"
    );
    if let Some(ref room) = conn.room {
        let notice = ServerMessage::system(format!("{} disconnected", conn.name));
        broadcast(registry, room, &notice, Some(id));
    }
    Some(conn)
}

fn join(registry: &mut Registry, id: &str, room_id: &str, name: Option<&str>) {
    let room = room_id.trim();
    if room.is_empty() {
        reply(registry, id, ServerMessage::rejection(Rejection::RoomIdRequired));
        return;
    }

    let Some(conn) = registry.find_mut(id) else {
        return;
    };
    let prior_name = conn.name.clone();
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        conn.name = name.to_owned();
    }
    let previous = conn.room.replace(room.to_owned());
    let name = conn.name.clone();

    reply(
        registry,
        id,
        ServerMessage::Joined { room_id: room.to_owned(), user_id: id.to_owned(), name: name.clone() },
    );

    match previous {
        Some(ref old) if old == room => {
            tracing::debug!(conn_id = %id, room, "rejoined current room");
        }
        Some(old) => {
            let notice = ServerMessage::system(format!("{prior_name} left room {old}"));
            broadcast(registry, &old, &notice, Some(id));
            announce_join(registry, id, room, &name);
            tracing::info!(conn_id = %id, from = %old, to = room, "switched room");
        }
        None => {
            announce_join(registry, id, room, &name);
            tracing::info!(conn_id = %id, room, "joined room");
        }
    }
}

fn announce_join(registry: &Registry, id: &str, room: &str, name: &str) {
    let notice = ServerMessage::system(format!("{name} joined room {room}"));
    broadcast(registry, room, &notice, Some(id));
}

fn leave(registry: &mut Registry, id: &str) {
    let Some(conn) = registry.find_mut(id) else {
        return;
    };
    let Some(old) = conn.room.take() else {
        reply(registry, id, ServerMessage::rejection(Rejection::NotInRoom));
        return;
    };
    let name = conn.name.clone();

    reply(registry, id, ServerMessage::Left { room_id: old.clone(), user_id: id.to_owned() });
    let notice = ServerMessage::system(format!("{name} left room {old}"));
    broadcast(registry, &old, &notice, Some(id));
    tracing::info!(conn_id = %id, room = %old, "left room");
}

fn chat(registry: &Registry, id: &str, message: &str, limits: DispatchLimits) {
    let Some(conn) = registry.find(id) else {
        return;
    };
    let Some(ref room) = conn.room else {
        send_to(conn, &ServerMessage::rejection(Rejection::NotInRoom));
        return;
    };
    let text = message.trim();
    if text.is_empty() {
        send_to(conn, &ServerMessage::rejection(Rejection::MessageRequired));
        return;
    }
    if text.chars().count() > limits.max_message_chars {
        send_to(conn, &ServerMessage::rejection(Rejection::MessageTooLong));
        return;
    }

    let msg = ServerMessage::Chat {
        room_id: room.clone(),
        user_id: id.to_owned(),
        name: conn.name.clone(),
        message: text.to_owned(),
        time: epoch_ms(),
    };
    let delivered = broadcast(registry, room, &msg, None);
    tracing::debug!(conn_id = %id, room = %room, delivered, "chat relayed");
}

fn who(registry: &Registry, id: &str) {
    let Some(conn) = registry.find(id) else {
        return;
    };
    let msg = match conn.room {
        Some(ref room) => {
            ServerMessage::Who { room_id: room.clone(), members: members_of(registry, room) }
        }
        None => ServerMessage::rejection(Rejection::NotInRoom),
    };
    send_to(conn, &msg);
}

fn reply(registry: &Registry, id: &str, msg: ServerMessage) {
    if let Some(conn) = registry.find(id) {
        send_to(conn, &msg);
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
