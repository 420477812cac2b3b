// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::{tempdir, TempDir};

struct Home {
    _dir: TempDir,
    home: PathBuf,
    state_root: PathBuf,
    workdir: PathBuf,
}

/// A fake home with a state root and a git worktree inside it. HOME is
/// repointed so the home-containment check sees this layout.
fn home() -> Home {
    let dir = tempdir().unwrap();
    let home = dir.path().canonicalize().unwrap();
    let state_root = home.join(".local/state/omc");
    let workdir = home.join("project");
    fs::create_dir_all(state_root.join("configs")).unwrap();
    fs::create_dir_all(workdir.join(".git")).unwrap();
    std::env::set_var("HOME", &home);
    Home { _dir: dir, home, state_root, workdir }
}

fn write_config(path: &Path, workdir: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        path,
        serde_json::json!({
            "teamName": "backend",
            "workerName": "w1",
            "provider": "codex",
            "workingDirectory": workdir,
        })
        .to_string(),
    )
    .unwrap();
}

#[test]
#[serial]
fn loads_valid_config_under_state_root() {
    let fx = home();
    let config_path = fx.state_root.join("configs/w1.json");
    write_config(&config_path, &fx.workdir);

    let config = load(&config_path, &fx.state_root).unwrap();
    assert_eq!(config.team_name, "backend");
    assert_eq!(config.worker_name, "w1");
    assert_eq!(config.working_directory, fx.workdir.canonicalize().unwrap());
    assert_eq!(config.poll_interval_ms, 3_000);
}

#[test]
#[serial]
fn accepts_config_under_an_omc_subtree() {
    let fx = home();
    let config_path = fx.workdir.join(".omc/worker.json");
    write_config(&config_path, &fx.workdir);

    load(&config_path, &fx.state_root).unwrap();
}

#[test]
#[serial]
fn rejects_config_outside_trusted_locations() {
    let fx = home();
    let config_path = fx.home.join("stray.json");
    write_config(&config_path, &fx.workdir);

    assert!(matches!(
        load(&config_path, &fx.state_root),
        Err(ConfigError::UntrustedLocation(_))
    ));
}

#[test]
#[serial]
fn rejects_missing_config_file() {
    let fx = home();
    assert!(matches!(
        load(&fx.state_root.join("configs/none.json"), &fx.state_root),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
#[serial]
fn rejects_malformed_config_document() {
    let fx = home();
    let config_path = fx.state_root.join("configs/bad.json");
    fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    fs::write(&config_path, "{\"teamName\": 1}").unwrap();

    assert!(matches!(
        load(&config_path, &fx.state_root),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
#[serial]
fn rejects_missing_working_directory() {
    let fx = home();
    let config_path = fx.state_root.join("configs/w1.json");
    write_config(&config_path, &fx.home.join("does-not-exist"));

    assert!(matches!(
        load(&config_path, &fx.state_root),
        Err(ConfigError::BadWorkingDirectory(_))
    ));
}

#[test]
#[serial]
fn rejects_working_directory_outside_home() {
    let fx = home();
    let outside = tempdir().unwrap();
    fs::create_dir_all(outside.path().join(".git")).unwrap();
    let config_path = fx.state_root.join("configs/w1.json");
    write_config(&config_path, outside.path());

    assert!(matches!(
        load(&config_path, &fx.state_root),
        Err(ConfigError::OutsideHome(_))
    ));
}

#[test]
#[serial]
fn rejects_working_directory_outside_a_worktree() {
    let fx = home();
    let bare = fx.home.join("no-vcs");
    fs::create_dir_all(&bare).unwrap();
    let config_path = fx.state_root.join("configs/w1.json");
    write_config(&config_path, &bare);

    assert!(matches!(
        load(&config_path, &fx.state_root),
        Err(ConfigError::NotAWorktree(_))
    ));
}

#[test]
#[serial]
fn worktree_root_may_be_an_ancestor() {
    let fx = home();
    let nested = fx.workdir.join("crates/sub");
    fs::create_dir_all(&nested).unwrap();
    let config_path = fx.state_root.join("configs/w1.json");
    write_config(&config_path, &nested);

    let config = load(&config_path, &fx.state_root).unwrap();
    assert!(config.working_directory.ends_with("crates/sub"));
}

#[test]
#[serial]
fn sanitizes_team_and_worker_names() {
    let fx = home();
    let config_path = fx.state_root.join("configs/w1.json");
    fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    fs::write(
        &config_path,
        serde_json::json!({
            "teamName": "Team Alpha!",
            "workerName": "worker one",
            "provider": "gemini",
            "workingDirectory": fx.workdir,
        })
        .to_string(),
    )
    .unwrap();

    let config = load(&config_path, &fx.state_root).unwrap();
    assert_eq!(config.team_name, "Team-Alpha");
    assert_eq!(config.worker_name, "worker-one");
}
