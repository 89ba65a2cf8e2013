// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;
use tokio::sync::mpsc;

use super::{disconnect, dispatch, handle_frame, open, DispatchLimits, GREETING};
use crate::peer::{Outbound, PeerHandle};
use crate::protocol::ClientRequest;
use crate::registry::{Registry, DEFAULT_NAME};
use crate::test_support::{drain_frames, frame};

type Rx = mpsc::UnboundedReceiver<Outbound>;

/// Open a connection through the normal path and discard the greeting.
fn connect(reg: &mut Registry, id: &str) -> anyhow::Result<Rx> {
    let (peer, mut rx) = PeerHandle::channel();
    open(reg, id.to_owned(), peer)?;
    let greeting = drain_frames(&mut rx);
    assert_eq!(greeting.len(), 1);
    assert_eq!(greeting[0]["payload"]["message"], GREETING);
    Ok(rx)
}

fn send(reg: &mut Registry, id: &str, value: serde_json::Value) {
    handle_frame(reg, id, &frame(value), DispatchLimits::default());
}

fn join(reg: &mut Registry, id: &str, room: &str, name: &str) {
    send(reg, id, json!({"type": "join", "payload": {"roomId": room, "name": name}}));
}

fn system_text(value: &serde_json::Value) -> Option<&str> {
    if value["type"] == "system" {
        value["payload"]["message"].as_str()
    } else {
        None
    }
}

#[test]
fn join_replies_joined_and_sets_room() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;

    join(&mut reg, "a", "lobby", "Ayush");

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1, "frames: {frames:?}");
    assert_eq!(frames[0]["type"], "joined");
    assert_eq!(frames[0]["payload"]["roomId"], "lobby");
    assert_eq!(frames[0]["payload"]["userId"], "a");
    assert_eq!(frames[0]["payload"]["name"], "Ayush");

    let conn = reg.find("a").ok_or_else(|| anyhow::anyhow!("a missing"))?;
    assert_eq!(conn.room.as_deref(), Some("lobby"));
    assert_eq!(conn.name, "Ayush");
    Ok(())
}

#[test]
fn join_trims_room_and_name() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;

    join(&mut reg, "a", "  lobby ", "  Ayush\t");

    let frames = drain_frames(&mut a);
    assert_eq!(frames[0]["payload"]["roomId"], "lobby");
    assert_eq!(frames[0]["payload"]["name"], "Ayush");
    Ok(())
}

#[test]
fn join_without_name_keeps_default() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;

    send(&mut reg, "a", json!({"type": "join", "payload": {"roomId": "lobby"}}));
    join(&mut reg, "a", "dev", "   ");

    let frames = drain_frames(&mut a);
    assert_eq!(frames[0]["payload"]["name"], DEFAULT_NAME);
    assert_eq!(frames[1]["payload"]["name"], DEFAULT_NAME);
    Ok(())
}

#[yare::parameterized(
    empty      = { "" },
    whitespace = { "   " },
)]
fn join_requires_room_id(room: &str) {
    let mut reg = Registry::new();
    let Ok(mut a) = connect(&mut reg, "a") else {
        panic!("connect failed");
    };

    join(&mut reg, "a", room, "Ayush");

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1);
    assert_eq!(system_text(&frames[0]), Some("roomId is required"));
    let conn = reg.find("a");
    assert!(conn.is_some_and(|c| c.room.is_none() && c.name == DEFAULT_NAME));
}

#[test]
fn join_notifies_other_members_but_not_self() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let mut b = connect(&mut reg, "b")?;
    let mut c = connect(&mut reg, "c")?;
    join(&mut reg, "a", "lobby", "Ayush");
    join(&mut reg, "c", "dev", "Cara");
    drain_frames(&mut a);
    drain_frames(&mut c);

    join(&mut reg, "b", "lobby", "Bo");

    let a_frames = drain_frames(&mut a);
    assert_eq!(a_frames.len(), 1);
    assert_eq!(system_text(&a_frames[0]), Some("Bo joined room lobby"));

    let b_frames = drain_frames(&mut b);
    assert_eq!(b_frames.len(), 1);
    assert_eq!(b_frames[0]["type"], "joined");

    assert!(drain_frames(&mut c).is_empty());
    Ok(())
}

#[test]
fn switching_rooms_leaves_the_old_one_first() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let mut b = connect(&mut reg, "b")?;
    let mut c = connect(&mut reg, "c")?;
    join(&mut reg, "a", "lobby", "Ayush");
    join(&mut reg, "b", "lobby", "Bo");
    join(&mut reg, "c", "dev", "Cara");
    drain_frames(&mut a);
    drain_frames(&mut b);
    drain_frames(&mut c);

    join(&mut reg, "b", "dev", "Bobby");

    let a_frames = drain_frames(&mut a);
    assert_eq!(a_frames.len(), 1);
    assert_eq!(system_text(&a_frames[0]), Some("Bo left room lobby"));

    let c_frames = drain_frames(&mut c);
    assert_eq!(c_frames.len(), 1);
    assert_eq!(system_text(&c_frames[0]), Some("Bobby joined room dev"));

    let b_frames = drain_frames(&mut b);
    assert_eq!(b_frames.len(), 1);
    assert_eq!(b_frames[0]["type"], "joined");
    assert_eq!(b_frames[0]["payload"]["roomId"], "dev");

    let b_conn = reg.find("b").ok_or_else(|| anyhow::anyhow!("b missing"))?;
    assert_eq!(b_conn.room.as_deref(), Some("dev"));
    Ok(())
}

#[test]
fn rejoining_same_room_is_silent_to_others() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let mut b = connect(&mut reg, "b")?;
    join(&mut reg, "a", "lobby", "Ayush");
    join(&mut reg, "b", "lobby", "Bo");
    drain_frames(&mut a);
    drain_frames(&mut b);

    join(&mut reg, "b", "lobby", "Bob");

    assert!(drain_frames(&mut a).is_empty());
    let b_frames = drain_frames(&mut b);
    assert_eq!(b_frames.len(), 1);
    assert_eq!(b_frames[0]["payload"]["name"], "Bob");
    Ok(())
}

#[test]
fn leave_replies_left_and_notifies_remaining() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let mut b = connect(&mut reg, "b")?;
    join(&mut reg, "a", "lobby", "Ayush");
    join(&mut reg, "b", "lobby", "Bo");
    drain_frames(&mut a);
    drain_frames(&mut b);

    send(&mut reg, "b", json!({"type": "leave"}));

    let b_frames = drain_frames(&mut b);
    assert_eq!(b_frames.len(), 1);
    assert_eq!(b_frames[0]["type"], "left");
    assert_eq!(b_frames[0]["payload"]["roomId"], "lobby");
    assert_eq!(b_frames[0]["payload"]["userId"], "b");

    let a_frames = drain_frames(&mut a);
    assert_eq!(system_text(&a_frames[0]), Some("Bo left room lobby"));

    assert!(reg.find("b").is_some_and(|c| c.room.is_none()));
    Ok(())
}

#[test]
fn leave_without_room_is_rejected() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;

    send(&mut reg, "a", json!({"type": "leave"}));

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1);
    assert_eq!(system_text(&frames[0]), Some("not in any room"));
    Ok(())
}

#[test]
fn chat_reaches_whole_room_including_sender() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let mut b = connect(&mut reg, "b")?;
    let mut c = connect(&mut reg, "c")?;
    join(&mut reg, "a", "lobby", "Ayush");
    join(&mut reg, "b", "lobby", "Bo");
    join(&mut reg, "c", "dev", "Cara");
    drain_frames(&mut a);
    drain_frames(&mut b);
    drain_frames(&mut c);

    send(&mut reg, "b", json!({"type": "chat", "payload": {"message": "  hi "}}));

    for rx in [&mut a, &mut b] {
        let frames = drain_frames(rx);
        assert_eq!(frames.len(), 1);
        let chat = &frames[0];
        assert_eq!(chat["type"], "chat");
        assert_eq!(chat["payload"]["roomId"], "lobby");
        assert_eq!(chat["payload"]["userId"], "b");
        assert_eq!(chat["payload"]["name"], "Bo");
        assert_eq!(chat["payload"]["message"], "hi");
        assert!(chat["payload"]["time"].as_u64().is_some_and(|t| t > 0));
    }
    assert!(drain_frames(&mut c).is_empty());
    Ok(())
}

#[test]
fn chat_before_join_is_rejected_without_broadcast() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let mut b = connect(&mut reg, "b")?;
    join(&mut reg, "b", "lobby", "Bo");
    drain_frames(&mut b);

    send(&mut reg, "a", json!({"type": "chat", "payload": {"message": "hi"}}));

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1);
    assert_eq!(system_text(&frames[0]), Some("not in any room"));
    assert!(drain_frames(&mut b).is_empty());
    Ok(())
}

#[yare::parameterized(
    empty      = { "", "message is required" },
    whitespace = { " \n\t ", "message is required" },
    too_long   = { &"x".repeat(2001), "message is too long" },
)]
fn chat_validation(message: &str, expected: &str) {
    let mut reg = Registry::new();
    let Ok(mut a) = connect(&mut reg, "a") else {
        panic!("connect failed");
    };
    join(&mut reg, "a", "lobby", "Ayush");
    drain_frames(&mut a);

    send(&mut reg, "a", json!({"type": "chat", "payload": {"message": message}}));

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1);
    assert_eq!(system_text(&frames[0]), Some(expected));
}

#[test]
fn chat_limit_counts_chars_not_bytes() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    join(&mut reg, "a", "lobby", "Ayush");
    drain_frames(&mut a);

    let limits = DispatchLimits { max_message_chars: 3 };
    dispatch(&mut reg, "a", ClientRequest::Chat { message: "héé".to_owned() }, limits);

    let frames = drain_frames(&mut a);
    assert_eq!(frames[0]["type"], "chat");
    Ok(())
}

#[test]
fn who_lists_room_members_including_caller() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let _b = connect(&mut reg, "b")?;
    let _c = connect(&mut reg, "c")?;
    join(&mut reg, "a", "lobby", "Ayush");
    join(&mut reg, "b", "lobby", "Bo");
    join(&mut reg, "c", "dev", "Cara");
    drain_frames(&mut a);

    send(&mut reg, "a", json!({"type": "who"}));

    let frames = drain_frames(&mut a);
    assert_eq!(frames[0]["type"], "who");
    assert_eq!(frames[0]["payload"]["roomId"], "lobby");
    let members = frames[0]["payload"]["members"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("members not an array"))?;
    let mut ids: Vec<&str> = members.iter().filter_map(|m| m["userId"].as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a", "b"]);
    Ok(())
}

#[test]
fn who_without_room_is_rejected() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;

    send(&mut reg, "a", json!({"type": "who"}));

    let frames = drain_frames(&mut a);
    assert_eq!(system_text(&frames[0]), Some("not in any room"));
    Ok(())
}

#[test]
fn rooms_summarises_occupied_rooms() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let _b = connect(&mut reg, "b")?;
    let _c = connect(&mut reg, "c")?;
    join(&mut reg, "b", "lobby", "Bo");
    join(&mut reg, "c", "lobby", "Cara");

    send(&mut reg, "a", json!({"type": "rooms"}));

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "rooms");
    assert_eq!(frames[0]["payload"]["rooms"], json!([{"roomId": "lobby", "count": 2}]));
    Ok(())
}

#[test]
fn ping_replies_pong() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;

    send(&mut reg, "a", json!({"type": "ping"}));

    let frames = drain_frames(&mut a);
    assert_eq!(frames, vec![json!({"type": "pong"})]);
    Ok(())
}

#[test]
fn dataless_requests_accept_empty_payload() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    join(&mut reg, "a", "lobby", "Ayush");
    drain_frames(&mut a);

    send(&mut reg, "a", json!({"type": "ping", "payload": {}}));
    send(&mut reg, "a", json!({"type": "leave", "payload": {}}));

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], json!({"type": "pong"}));
    assert_eq!(frames[1]["type"], "left");
    assert!(reg.find("a").is_some_and(|c| c.room.is_none()));
    Ok(())
}

#[yare::parameterized(
    garbage      = { b"not json" },
    unknown_type = { br#"{"type":"dance"}"# },
    missing_room = { br#"{"type":"join","payload":{}}"# },
)]
fn undecodable_frame_gets_one_system_reply(raw: &[u8]) {
    let mut reg = Registry::new();
    let Ok(mut a) = connect(&mut reg, "a") else {
        panic!("connect failed");
    };

    handle_frame(&mut reg, "a", raw, DispatchLimits::default());

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1);
    assert_eq!(system_text(&frames[0]), Some("invalid/unknown message"));
    assert_eq!(reg.len(), 1);
    assert!(reg.find("a").is_some_and(|c| c.room.is_none()));
}

#[test]
fn frames_from_unregistered_connections_are_dropped() {
    let mut reg = Registry::new();
    send(&mut reg, "ghost", json!({"type": "ping"}));
    assert!(reg.is_empty());
}

#[test]
fn disconnect_notifies_room_and_is_idempotent() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let _b = connect(&mut reg, "b")?;
    join(&mut reg, "a", "lobby", "Ayush");
    join(&mut reg, "b", "lobby", "Bo");
    drain_frames(&mut a);

    let removed = disconnect(&mut reg, "b");
    assert_eq!(removed.map(|c| c.name), Some("Bo".to_owned()));

    let frames = drain_frames(&mut a);
    assert_eq!(frames.len(), 1);
    assert_eq!(system_text(&frames[0]), Some("Bo disconnected"));

    assert!(disconnect(&mut reg, "b").is_none());
    assert!(drain_frames(&mut a).is_empty());
    assert_eq!(reg.len(), 1);
    Ok(())
}

#[test]
fn disconnect_without_room_broadcasts_nothing() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let mut a = connect(&mut reg, "a")?;
    let _b = connect(&mut reg, "b")?;
    join(&mut reg, "a", "lobby", "Ayush");
    drain_frames(&mut a);

    assert!(disconnect(&mut reg, "b").is_some());
    assert!(drain_frames(&mut a).is_empty());
    Ok(())
}

#[test]
fn open_rejects_duplicate_ids() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let _a = connect(&mut reg, "a")?;
    let (peer, _rx) = PeerHandle::channel();
    crate::assert_err_contains!(open(&mut reg, "a".to_owned(), peer), "already registered");
    Ok(())
}

#[test]
fn open_stamps_connect_time() -> anyhow::Result<()> {
    let mut reg = Registry::new();
    let before = crate::state::epoch_ms();
    let _a = connect(&mut reg, "a")?;
    let conn = reg.find("a").ok_or_else(|| anyhow::anyhow!("a not registered"))?;
    assert!(conn.connected_at >= before);
    assert_eq!(conn.age_ms(conn.connected_at + 250), 250);
    Ok(())
}
