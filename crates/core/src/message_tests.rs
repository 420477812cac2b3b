// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::task::TaskId;
use chrono::DateTime;

fn ts() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
}

#[test]
fn inbox_message_parses_lead_line() {
    let msg: InboxMessage = serde_json::from_str(
        r#"{"type":"context","content":"focus on the parser","timestamp":"2024-01-01T00:00:00Z"}"#,
    )
    .unwrap();
    assert_eq!(msg.kind, "context");
    assert_eq!(msg.content, "focus on the parser");
}

#[test]
fn inbox_message_preserves_unknown_kinds() {
    let msg: InboxMessage = serde_json::from_str(
        r#"{"type":"some_future_kind","content":"x","timestamp":"2024-01-01T00:00:00Z"}"#,
    )
    .unwrap();
    assert_eq!(msg.kind, "some_future_kind");
}

#[test]
fn task_complete_wire_format() {
    let msg = OutboxMessage::TaskComplete {
        task_id: TaskId::parse("1").unwrap(),
        summary: "ok".to_string(),
        timestamp: ts(),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "task_complete");
    assert_eq!(value["taskId"], "1");
    assert_eq!(value["summary"], "ok");
    assert!(value["timestamp"].is_string());
}

#[test]
fn task_failed_wire_format() {
    let msg = OutboxMessage::TaskFailed {
        task_id: TaskId::parse("7").unwrap(),
        error: "boom".to_string(),
        attempt: 2,
        timestamp: ts(),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "task_failed");
    assert_eq!(value["taskId"], "7");
    assert_eq!(value["attempt"], 2);
}

#[test]
fn shutdown_ack_wire_format() {
    let msg = OutboxMessage::ShutdownAck {
        request_id: "req-9".to_string(),
        timestamp: ts(),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "shutdown_ack");
    assert_eq!(value["requestId"], "req-9");
}

#[test]
fn round_trips_every_variant() {
    let variants = vec![
        OutboxMessage::TaskComplete {
            task_id: TaskId::parse("1").unwrap(),
            summary: "s".into(),
            timestamp: ts(),
        },
        OutboxMessage::TaskFailed {
            task_id: TaskId::parse("1").unwrap(),
            error: "e".into(),
            attempt: 1,
            timestamp: ts(),
        },
        OutboxMessage::Error { message: "m".into(), timestamp: ts() },
        OutboxMessage::Idle { message: "m".into(), timestamp: ts() },
        OutboxMessage::ShutdownAck { request_id: "r".into(), timestamp: ts() },
    ];
    for msg in variants {
        let line = serde_json::to_string(&msg).unwrap();
        let back: OutboxMessage = serde_json::from_str(&line).unwrap();
        assert_eq!(back, msg);
        assert_eq!(serde_json::to_value(&msg).unwrap()["type"], msg.kind());
    }
}
