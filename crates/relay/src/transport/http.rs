// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP read endpoints for the relay.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::protocol::RoomCount;
use crate::state::RelayState;

// -- Response types -----------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
    pub rooms: usize,
}

#[derive(Debug, Serialize)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomCount>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<RelayState>>) -> impl IntoResponse {
    let (connections, rooms) = {
        let registry = s.registry.lock();
        (registry.len(), crate::rooms::room_summary(&registry).len())
    };
    Json(HealthResponse { status: "running".to_owned(), connections, rooms })
}

/// `GET /api/v1/rooms`
pub async fn list_rooms(State(s): State<Arc<RelayState>>) -> impl IntoResponse {
    Json(RoomsResponse { rooms: s.room_summary() })
}
