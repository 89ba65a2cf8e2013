// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the relay WebSocket.
//!
//! Every frame is a JSON object `{"type": ..., "payload": {...}}` with the
//! payload omitted for requests and replies that carry no data. Field names
//! inside payloads are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::error::{DecodeError, Rejection};

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientRequest {
    Join {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Leave,
    Chat {
        message: String,
    },
    Who,
    Rooms,
    Ping,
}

impl ClientRequest {
    /// Short request name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::Chat { .. } => "chat",
            Self::Who => "who",
            Self::Rooms => "rooms",
            Self::Ping => "ping",
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    System {
        message: String,
    },
    Joined {
        room_id: String,
        user_id: String,
        name: String,
    },
    Left {
        room_id: String,
        user_id: String,
    },
    Chat {
        room_id: String,
        user_id: String,
        name: String,
        message: String,
        time: u64,
    },
    Who {
        room_id: String,
        members: Vec<Member>,
    },
    Rooms {
        rooms: Vec<RoomCount>,
    },
    Pong,
}

impl ServerMessage {
    pub fn system(message: impl Into<String>) -> Self {
        Self::System { message: message.into() }
    }

    pub fn rejection(rejection: Rejection) -> Self {
        Self::system(rejection.message())
    }
}

/// One entry of a `who` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: String,
    pub name: String,
}

/// One entry of a `rooms` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCount {
    pub room_id: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Parse a raw inbound frame. Total: every input maps to a request or an error.
///
/// Requests without data accept an absent, `null`, or empty-object payload.
pub fn decode(frame: &[u8]) -> Result<ClientRequest, DecodeError> {
    let mut value: serde_json::Value = serde_json::from_slice(frame).map_err(classify)?;
    if let Some(obj) = value.as_object_mut() {
        if obj.get("payload").and_then(|p| p.as_object()).is_some_and(|m| m.is_empty()) {
            obj.remove("payload");
        }
    }
    serde_json::from_value(value).map_err(classify)
}

fn classify(e: serde_json::Error) -> DecodeError {
    match e.classify() {
        Category::Data => DecodeError::Shape(e.to_string()),
        Category::Syntax | Category::Eof | Category::Io => DecodeError::Syntax(e.to_string()),
    }
}

/// Frame sent in place of a message that failed to serialize.
const ENCODE_FALLBACK: &str = r#"{"type":"system","payload":{"message":"internal error"}}"#;

/// Serialize a server message to a text frame.
pub fn encode(msg: &ServerMessage) -> String {
    serde_json::to_string(msg).unwrap_or_else(|_| ENCODE_FALLBACK.to_owned())
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
