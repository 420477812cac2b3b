// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    numeric = { "1" },
    alpha = { "task-42" },
    dotted = { "fix.login_form" },
    mixed = { "A1_b2-c3.d4" },
)]
fn accepts_valid_ids(id: &str) {
    assert_eq!(TaskId::parse(id).unwrap().as_str(), id);
}

#[parameterized(
    slash = { "a/b" },
    traversal = { "../escape" },
    dot = { "." },
    dot_dot = { ".." },
    space = { "a b" },
    unicode = { "tâche" },
)]
fn rejects_unsafe_ids(id: &str) {
    assert!(matches!(TaskId::parse(id), Err(TaskIdError::Unsafe(_))));
}

#[test]
fn rejects_empty_id() {
    assert_eq!(TaskId::parse(""), Err(TaskIdError::Empty));
}

#[test]
fn deserializes_minimal_document() {
    let task: Task = serde_json::from_value(serde_json::json!({
        "id": "1",
        "owner": "w",
        "status": "pending",
    }))
    .unwrap();
    assert_eq!(task.id, "1");
    assert_eq!(task.subject, "");
    assert!(task.blocked_by.is_empty());
    assert!(task.metadata.is_empty());
    assert_eq!(task.claimed_by, None);
    assert_eq!(task.claim_pid, None);
}

#[test]
fn deserializes_claim_fields_and_blockers() {
    let task: Task = serde_json::from_value(serde_json::json!({
        "id": "2",
        "subject": "s",
        "description": "d",
        "owner": "w",
        "status": "in_progress",
        "blockedBy": ["0", "1"],
        "claimedBy": "w",
        "claimedAt": 123u64,
        "claimPid": 42u32,
        "metadata": {"priority": "high"},
    }))
    .unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.blocked_by.len(), 2);
    assert_eq!(task.claimed_by.as_deref(), Some("w"));
    assert_eq!(task.claimed_at, Some(123));
    assert_eq!(task.claim_pid, Some(42));
    assert_eq!(task.metadata["priority"], "high");
}

#[test]
fn rejects_document_with_traversal_id() {
    let result: Result<Task, _> = serde_json::from_value(serde_json::json!({
        "id": "../../etc/passwd",
        "owner": "w",
        "status": "pending",
    }));
    assert!(result.is_err());
}

#[test]
fn status_serializes_snake_case() {
    assert_eq!(
        serde_json::to_value(TaskStatus::InProgress).unwrap(),
        serde_json::json!("in_progress")
    );
    assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
}
