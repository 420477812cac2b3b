// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn minimal_document_gets_defaults() {
    let config: BridgeConfig = serde_json::from_value(serde_json::json!({
        "teamName": "backend",
        "workerName": "w1",
        "provider": "codex",
        "workingDirectory": "/home/dev/project",
    }))
    .unwrap();
    assert_eq!(config.model, None);
    assert_eq!(config.poll_interval_ms, 3_000);
    assert_eq!(config.task_timeout_ms, 600_000);
    assert_eq!(config.max_consecutive_errors, 3);
    assert_eq!(config.outbox_max_lines, 500);
    assert_eq!(config.max_retries, 5);
}

#[test]
fn overrides_are_honored() {
    let config: BridgeConfig = serde_json::from_value(serde_json::json!({
        "teamName": "backend",
        "workerName": "w1",
        "provider": "gemini",
        "workingDirectory": "/home/dev/project",
        "model": "gemini-2.5-pro",
        "pollIntervalMs": 100,
        "taskTimeoutMs": 5_000,
        "maxConsecutiveErrors": 1,
        "outboxMaxLines": 10,
        "maxRetries": 2,
    }))
    .unwrap();
    assert_eq!(config.provider, Provider::Gemini);
    assert_eq!(config.model.as_deref(), Some("gemini-2.5-pro"));
    assert_eq!(config.poll_interval(), std::time::Duration::from_millis(100));
    assert_eq!(config.max_retries, 2);
}

#[test]
fn unknown_provider_is_rejected() {
    let result: Result<BridgeConfig, _> = serde_json::from_value(serde_json::json!({
        "teamName": "backend",
        "workerName": "w1",
        "provider": "claude",
        "workingDirectory": "/home/dev/project",
    }));
    assert!(result.is_err());
}
