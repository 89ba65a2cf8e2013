// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-side room queries. Rooms have no record of their own; every answer is
//! recomputed from the registry.

use std::collections::BTreeMap;

use crate::protocol::{Member, RoomCount};
use crate::registry::Registry;

/// Snapshot of the members of `room`.
pub fn members_of(registry: &Registry, room: &str) -> Vec<Member> {
    registry
        .all_matching(|c| c.in_room(room))
        .into_iter()
        .map(|c| Member { user_id: c.id.clone(), name: c.name.clone() })
        .collect()
}

/// One entry per occupied room, sorted by room id.
pub fn room_summary(registry: &Registry) -> Vec<RoomCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for room in registry.iter().filter_map(|c| c.room.as_deref()) {
        *counts.entry(room).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(room_id, count)| RoomCount { room_id: room_id.to_owned(), count })
        .collect()
}

#[cfg(test)]
#[path = "rooms_tests.rs"]
mod tests;
