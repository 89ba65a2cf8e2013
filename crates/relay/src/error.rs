// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Registry mutation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateId(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "connection id already registered: {id}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Why an inbound frame could not be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not JSON at all (bad syntax, truncated, not UTF-8).
    Syntax(String),
    /// Valid JSON that is not a known request (unknown type, missing field).
    Shape(String),
}

impl DecodeError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "SYNTAX",
            Self::Shape(_) => "SHAPE",
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(detail) | Self::Shape(detail) => write!(f, "{}: {detail}", self.as_str()),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Precondition violations answered with a `system` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidMessage,
    RoomIdRequired,
    NotInRoom,
    MessageRequired,
    MessageTooLong,
}

impl Rejection {
    /// Client-facing text carried in the `system` payload.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "invalid/unknown message",
            Self::RoomIdRequired => "roomId is required",
            Self::NotInRoom => "not in any room",
            Self::MessageRequired => "message is required",
            Self::MessageTooLong => "message is too long",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::RoomIdRequired => "ROOM_ID_REQUIRED",
            Self::NotInRoom => "NOT_IN_ROOM",
            Self::MessageRequired => "MESSAGE_REQUIRED",
            Self::MessageTooLong => "MESSAGE_TOO_LONG",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
