// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport-facing handle stored with every registered connection.
//!
//! The relay core never touches a socket. It pushes [`Outbound`] items onto
//! an unbounded channel that the owning WebSocket task drains, so every send
//! is non-blocking and safe to perform while the registry lock is held.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Work item for the socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A serialized server message.
    Frame(String),
    /// Liveness probe (sent as a WebSocket ping).
    Probe,
}

/// Why a push to a peer did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The peer was terminated or its socket task has exited.
    Closed,
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => f.write_str("peer closed"),
        }
    }
}

impl std::error::Error for SendError {}

/// Cheap, cloneable handle to one client session.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    tx: mpsc::UnboundedSender<Outbound>,
    cancel: CancellationToken,
}

impl PeerHandle {
    /// Create a handle plus the receiver the socket task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, cancel: CancellationToken::new() }, rx)
    }

    /// Whether frames pushed now can still reach the socket.
    pub fn is_open(&self) -> bool {
        !self.cancel.is_cancelled() && !self.tx.is_closed()
    }

    pub fn send(&self, frame: String) -> Result<(), SendError> {
        self.push(Outbound::Frame(frame))
    }

    pub fn probe(&self) -> Result<(), SendError> {
        self.push(Outbound::Probe)
    }

    /// Forcibly end the session. The socket task observes the token and exits.
    pub fn terminate(&self) {
        self.cancel.cancel();
    }

    /// Token the socket task selects on to notice [`terminate`](Self::terminate).
    pub fn terminated(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn push(&self, item: Outbound) -> Result<(), SendError> {
        if self.cancel.is_cancelled() {
            return Err(SendError::Closed);
        }
        self.tx.send(item).map_err(|_| SendError::Closed)
    }
}
