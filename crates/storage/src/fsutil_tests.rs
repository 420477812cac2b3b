// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;
use tempfile::tempdir;

#[test]
fn write_atomic_creates_parents_and_sets_mode() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a/b/doc.json");

    write_atomic(&path, b"{}").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"{}");
    let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(file_mode, FILE_MODE);
    let dir_mode = fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
    assert_eq!(dir_mode, DIR_MODE);
}

#[test]
fn write_atomic_replaces_existing_contents() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc");

    write_atomic(&path, b"one").unwrap();
    write_atomic(&path, b"two").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "two");
}

#[test]
fn write_atomic_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc");

    write_atomic(&path, b"x").unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["doc".to_string()]);
}

#[test]
fn write_json_pretty_ends_with_newline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");

    write_json_pretty(&path, &serde_json::json!({"a": 1})).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.ends_with('\n'));
    let back: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(back["a"], 1);
}

#[test]
fn append_line_accumulates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log");

    append_line(&path, "one").unwrap();
    append_line(&path, "two").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, FILE_MODE);
}
