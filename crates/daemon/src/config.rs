// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading and the fatal startup gate.
//!
//! Everything rejected here exits the process with code 1 before the
//! bridge loop starts; nothing in this module is recoverable.

use omc_core::{sanitize_name, BridgeConfig, SanitizeError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path} is not a valid worker configuration: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config must live under the state root or a .omc directory: {0}")]
    UntrustedLocation(PathBuf),

    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    #[error("working directory does not exist or is not a directory: {0}")]
    BadWorkingDirectory(PathBuf),

    #[error("could not determine home directory")]
    NoHome,

    #[error("working directory must resolve beneath the home directory: {0}")]
    OutsideHome(PathBuf),

    #[error("working directory is not inside a source-control worktree: {0}")]
    NotAWorktree(PathBuf),
}

/// Load and validate the worker configuration.
pub fn load(path: &Path, state_root: &Path) -> Result<BridgeConfig, ConfigError> {
    let resolved = path
        .canonicalize()
        .map_err(|e| ConfigError::Read { path: path.to_path_buf(), source: e })?;
    if !is_trusted_location(&resolved, state_root) {
        return Err(ConfigError::UntrustedLocation(resolved));
    }
    let raw = fs::read_to_string(&resolved)
        .map_err(|e| ConfigError::Read { path: resolved.clone(), source: e })?;
    let mut config: BridgeConfig = serde_json::from_str(&raw)
        .map_err(|e| ConfigError::Parse { path: resolved.clone(), source: e })?;
    config.team_name = sanitize_name(&config.team_name)?;
    config.worker_name = sanitize_name(&config.worker_name)?;
    config.working_directory = validate_working_directory(&config.working_directory)?;
    Ok(config)
}

/// Config files are only honored from the state root or a `.omc` subtree,
/// so a worker cannot be pointed at arbitrary documents elsewhere on disk.
fn is_trusted_location(path: &Path, state_root: &Path) -> bool {
    if let Ok(root) = state_root.canonicalize() {
        if path.starts_with(&root) {
            return true;
        }
    }
    path.components().any(|c| c.as_os_str() == ".omc")
}

fn validate_working_directory(dir: &Path) -> Result<PathBuf, ConfigError> {
    let resolved = dir
        .canonicalize()
        .map_err(|_| ConfigError::BadWorkingDirectory(dir.to_path_buf()))?;
    if !resolved.is_dir() {
        return Err(ConfigError::BadWorkingDirectory(resolved));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    let home = home.canonicalize().map_err(|_| ConfigError::NoHome)?;
    if !resolved.starts_with(&home) {
        return Err(ConfigError::OutsideHome(resolved));
    }
    if !in_worktree(&resolved) {
        return Err(ConfigError::NotAWorktree(resolved));
    }
    Ok(resolved)
}

fn in_worktree(dir: &Path) -> bool {
    dir.ancestors().any(|ancestor| ancestor.join(".git").exists())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
