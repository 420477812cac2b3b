// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-team task documents and the cooperative claim protocol.

use crate::fsutil::{self, FsError};
use crate::paths::{ensure_within, PathError};
use omc_core::{Clock, SystemClock, Task, TaskFailure, TaskId, TaskStatus};
use serde_json::json;
use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Delay between writing a claim and re-reading it for confirmation.
///
/// The delay widens the race window so that two concurrent claimers
/// (only ever stale restarts of the same worker) overwrite each other
/// deterministically instead of both proceeding. Overridable via
/// `OMC_CLAIM_DELAY_MS`.
pub const CLAIM_DELAY_MS: u64 = 50;

#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("task {0} does not exist")]
    Missing(TaskId),

    #[error("task {id} is not valid JSON: {source}")]
    Corrupt {
        id: TaskId,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of asking the store for work.
#[derive(Debug)]
pub enum Selection {
    /// A confirmed claim; the task is ready to execute.
    Claimed(Task),
    /// A candidate whose retry budget is spent; the caller must retire it
    /// instead of running it again.
    Exhausted { task: Task, failure: TaskFailure },
    /// Nothing claimable this cycle.
    Empty,
}

/// Store over one team's task directory, scoped to one worker.
pub struct TaskStore<C: Clock = SystemClock> {
    dir: PathBuf,
    worker: String,
    pid: u32,
    max_retries: u32,
    claim_delay: Duration,
    clock: C,
}

impl<C: Clock> TaskStore<C> {
    /// Open (creating if needed) the task directory for a team.
    pub fn new(
        dir: PathBuf,
        worker: impl Into<String>,
        pid: u32,
        max_retries: u32,
        clock: C,
    ) -> Result<Self, TaskStoreError> {
        fsutil::create_dir_private(&dir)?;
        let dir = dir
            .canonicalize()
            .map_err(|e| TaskStoreError::Io { path: dir.clone(), source: e })?;
        let claim_delay = std::env::var("OMC_CLAIM_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(CLAIM_DELAY_MS));
        Ok(Self { dir, worker: worker.into(), pid, max_retries, claim_delay, clock })
    }

    #[cfg(test)]
    fn with_claim_delay(mut self, delay: Duration) -> Self {
        self.claim_delay = delay;
        self
    }

    fn task_path(&self, id: &TaskId) -> Result<PathBuf, TaskStoreError> {
        Ok(ensure_within(&self.dir.join(id.as_str()), &self.dir)?)
    }

    fn failure_path(&self, id: &TaskId) -> Result<PathBuf, TaskStoreError> {
        Ok(ensure_within(&self.dir.join(format!("{}.failure", id)), &self.dir)?)
    }

    /// Read a task document. Missing or structurally invalid documents
    /// read as absent; the lead owns creation and repair.
    pub fn read(&self, id: &TaskId) -> Result<Option<Task>, TaskStoreError> {
        let path = self.task_path(id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TaskStoreError::Io { path, source: e }),
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Apply a shallow patch to a task document.
    ///
    /// The stored document is read as raw JSON and only the patched keys
    /// are replaced, so fields this worker version does not model survive
    /// the rewrite. The write is atomic.
    pub fn update(&self, id: &TaskId, patch: serde_json::Value) -> Result<(), TaskStoreError> {
        let path = self.task_path(id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TaskStoreError::Missing(id.clone()));
            }
            Err(e) => return Err(TaskStoreError::Io { path, source: e }),
        };
        let mut doc: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| TaskStoreError::Corrupt { id: id.clone(), source: e })?;
        if let (Some(obj), Some(patch_obj)) = (doc.as_object_mut(), patch.as_object()) {
            for (key, value) in patch_obj {
                obj.insert(key.clone(), value.clone());
            }
        }
        Ok(fsutil::write_json_pretty(&path, &doc)?)
    }

    /// Set the status field, leaving everything else (claims included) alone.
    pub fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), TaskStoreError> {
        self.update(id, json!({ "status": status }))
    }

    /// All task ids in this team's directory, numeric ids first in numeric
    /// order, then the rest lexicographically.
    pub fn list_ids(&self) -> Result<Vec<TaskId>, TaskStoreError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| TaskStoreError::Io { path: self.dir.clone(), source: e })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TaskStoreError::Io { path: self.dir.clone(), source: e })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') || name.ends_with(".failure") {
                continue;
            }
            if let Ok(id) = TaskId::parse(name) {
                ids.push(id);
            }
        }
        ids.sort_by(compare_ids);
        Ok(ids)
    }

    /// All listed blockers exist and are completed.
    pub fn blockers_resolved(&self, task: &Task) -> Result<bool, TaskStoreError> {
        for blocker in &task.blocked_by {
            match self.read(blocker)? {
                Some(t) if t.status == TaskStatus::Completed => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Create or increment the failure sidecar for a task.
    pub fn record_failure(&self, id: &TaskId, error: &str) -> Result<TaskFailure, TaskStoreError> {
        let attempts = self.read_failure(id)?.map_or(0, |f| f.attempts) + 1;
        let failure = TaskFailure {
            error: error.to_string(),
            attempts,
            last_failed_at: self.clock.now_utc(),
        };
        fsutil::write_json_pretty(&self.failure_path(id)?, &failure)?;
        Ok(failure)
    }

    /// Read the failure sidecar; absent or corrupt reads as no failures.
    pub fn read_failure(&self, id: &TaskId) -> Result<Option<TaskFailure>, TaskStoreError> {
        let path = self.failure_path(id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TaskStoreError::Io { path, source: e }),
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Whether a task's retry budget is spent.
    pub fn is_exhausted(&self, id: &TaskId) -> Result<bool, TaskStoreError> {
        Ok(self
            .read_failure(id)?
            .is_some_and(|f| f.attempts >= self.max_retries))
    }

    /// Find the next executable task for this worker and claim it.
    ///
    /// Candidates must be pending, owned by this worker, and unblocked. An
    /// exhausted candidate short-circuits as [`Selection::Exhausted`] so the
    /// caller can retire it without running it. For the rest, the claim
    /// dance: write our claim, wait, re-read, and accept only if the claim
    /// is still ours and the task still pending.
    pub async fn next_task(&self) -> Result<Selection, TaskStoreError> {
        for id in self.list_ids()? {
            let Some(task) = self.read(&id)? else { continue };
            if task.status != TaskStatus::Pending || task.owner != self.worker {
                continue;
            }
            if let Some(failure) = self.read_failure(&id)? {
                if failure.attempts >= self.max_retries {
                    return Ok(Selection::Exhausted { task, failure });
                }
            }
            if !self.blockers_resolved(&task)? {
                debug!(task = %id, "skipping blocked task");
                continue;
            }

            self.update(
                &id,
                json!({
                    "claimedBy": self.worker,
                    "claimedAt": self.clock.epoch_ms(),
                    "claimPid": self.pid,
                }),
            )?;
            tokio::time::sleep(self.claim_delay).await;
            let Some(confirmed) = self.read(&id)? else { continue };
            let claim_held = confirmed.status == TaskStatus::Pending
                && confirmed.claimed_by.as_deref() == Some(self.worker.as_str())
                && confirmed.claim_pid == Some(self.pid);
            if claim_held {
                info!(task = %id, "claimed task");
                return Ok(Selection::Claimed(confirmed));
            }
            debug!(task = %id, "lost claim race, skipping");
        }
        Ok(Selection::Empty)
    }
}

fn compare_ids(a: &TaskId, b: &TaskId) -> Ordering {
    match (a.as_str().parse::<u64>(), b.as_str().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.as_str().cmp(b.as_str()),
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
