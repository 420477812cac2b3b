// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use omc_core::{Provider, WorkerStatus};
use tempfile::tempdir;

fn plane(root: &Path) -> SignalPlane {
    let layout = FabricLayout::new(root);
    SignalPlane::new(&layout, Path::new("/home/dev/project"), "team", "w")
}

#[test]
fn no_signal_file_means_no_shutdown() {
    let dir = tempdir().unwrap();
    assert!(plane(dir.path()).read_shutdown().is_none());
}

#[test]
fn reads_and_clears_shutdown_signal() {
    let dir = tempdir().unwrap();
    let plane = plane(dir.path());
    fsutil::write_json_pretty(
        plane.signal_path(),
        &serde_json::json!({"requestId": "req-1", "reason": "redeploy"}),
    )
    .unwrap();

    let signal = plane.read_shutdown().unwrap();
    assert_eq!(signal.request_id, "req-1");
    assert_eq!(signal.reason, "redeploy");

    plane.clear_shutdown().unwrap();
    assert!(plane.read_shutdown().is_none());
    // clearing twice is fine
    plane.clear_shutdown().unwrap();
}

#[test]
fn malformed_signal_still_reads_as_shutdown() {
    let dir = tempdir().unwrap();
    let plane = plane(dir.path());
    fsutil::write_atomic(plane.signal_path(), b"garbage").unwrap();

    let signal = plane.read_shutdown().unwrap();
    assert_eq!(signal.request_id, "");
}

#[test]
fn heartbeat_round_trip_and_clear() {
    let dir = tempdir().unwrap();
    let plane = plane(dir.path());
    let heartbeat = Heartbeat {
        worker: "w".into(),
        team: "team".into(),
        provider: Provider::Codex,
        pid: 7,
        last_poll_at: Utc::now(),
        current_task_id: None,
        consecutive_errors: 0,
        status: WorkerStatus::Polling,
    };

    plane.write_heartbeat(&heartbeat).unwrap();
    let raw = fs::read_to_string(plane.heartbeat_path()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["status"], "polling");
    assert_eq!(doc["provider"], "codex");
    assert_eq!(doc["pid"], 7);

    plane.clear_heartbeat().unwrap();
    assert!(!plane.heartbeat_path().exists());
    plane.clear_heartbeat().unwrap();
}

#[test]
fn heartbeat_key_distinguishes_working_directories() {
    let dir = tempdir().unwrap();
    let layout = FabricLayout::new(dir.path());
    let a = SignalPlane::new(&layout, Path::new("/home/dev/a"), "team", "w");
    let b = SignalPlane::new(&layout, Path::new("/home/dev/b"), "team", "w");

    assert_ne!(a.heartbeat_path(), b.heartbeat_path());
}
