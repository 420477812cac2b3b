// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fabric directory layout and path containment.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path escapes its base directory: {candidate} (base: {base})")]
    Escape { candidate: PathBuf, base: PathBuf },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validate that `candidate` resolves strictly inside `base`.
///
/// Symlinks in the existing prefix of `candidate` are resolved first, so a
/// link pointing out of the tree is caught even when the leaf does not
/// exist yet. The remainder is then rejoined segment by segment, rejecting
/// any `..`. Returns the resolved path on success; no I/O has happened on
/// the candidate itself.
pub fn ensure_within(candidate: &Path, base: &Path) -> Result<PathBuf, PathError> {
    let base_resolved = base
        .canonicalize()
        .map_err(|e| PathError::Io { path: base.to_path_buf(), source: e })?;

    // Split the candidate into its deepest existing ancestor and the rest.
    let mut existing = candidate.to_path_buf();
    let mut remainder: Vec<std::ffi::OsString> = Vec::new();
    while !existing.exists() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                remainder.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => {
                return Err(PathError::Escape {
                    candidate: candidate.to_path_buf(),
                    base: base_resolved,
                });
            }
        }
    }
    let mut resolved = existing
        .canonicalize()
        .map_err(|e| PathError::Io { path: existing.clone(), source: e })?;
    for segment in remainder.iter().rev() {
        if segment == ".." || segment == "." {
            return Err(PathError::Escape {
                candidate: candidate.to_path_buf(),
                base: base_resolved,
            });
        }
        resolved.push(segment);
    }

    let relative = resolved.strip_prefix(&base_resolved).map_err(|_| PathError::Escape {
        candidate: candidate.to_path_buf(),
        base: base_resolved.clone(),
    })?;
    let strictly_inside = relative
        .components()
        .any(|c| matches!(c, Component::Normal(_)));
    if !strictly_inside {
        return Err(PathError::Escape { candidate: candidate.to_path_buf(), base: base_resolved });
    }
    Ok(resolved)
}

/// Directory layout under the per-user state root.
///
/// ```text
/// tasks/<team>/<id>              one task document per task
/// tasks/<team>/<id>.failure      failure sidecar
/// teams/<team>/inbox/<worker>    lead-to-worker log (+ <worker>.offset cursor)
/// teams/<team>/outbox/<worker>   worker-to-lead log
/// teams/<team>/signals/<worker>.shutdown
/// heartbeats/                    one liveness document per running worker
/// logs/                          daemon log files
/// ```
#[derive(Debug, Clone)]
pub struct FabricLayout {
    state_root: PathBuf,
}

impl FabricLayout {
    pub fn new(state_root: impl Into<PathBuf>) -> Self {
        Self { state_root: state_root.into() }
    }

    pub fn state_root(&self) -> &Path {
        &self.state_root
    }

    pub fn team_tasks_dir(&self, team: &str) -> PathBuf {
        self.state_root.join("tasks").join(team)
    }

    pub fn inbox_path(&self, team: &str, worker: &str) -> PathBuf {
        self.state_root.join("teams").join(team).join("inbox").join(worker)
    }

    pub fn outbox_path(&self, team: &str, worker: &str) -> PathBuf {
        self.state_root.join("teams").join(team).join("outbox").join(worker)
    }

    pub fn shutdown_signal_path(&self, team: &str, worker: &str) -> PathBuf {
        self.state_root
            .join("teams")
            .join(team)
            .join("signals")
            .join(format!("{}.shutdown", worker))
    }

    pub fn heartbeats_dir(&self) -> PathBuf {
        self.state_root.join("heartbeats")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_root.join("logs")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
