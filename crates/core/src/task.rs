// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task descriptors and failure sidecars.

use crate::sanitize::is_safe_char;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskIdError {
    #[error("task id is empty")]
    Empty,

    #[error("task id contains unsafe characters: {0:?}")]
    Unsafe(String),
}

/// Identifier for a task, used verbatim as a filename stem.
///
/// Task ids are assigned by the team lead and validated strictly rather
/// than rewritten: an id outside `[A-Za-z0-9._-]+` is rejected, not fixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn parse(id: impl Into<String>) -> Result<Self, TaskIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TaskIdError::Empty);
        }
        if id.chars().all(|c| c == '.') || !id.chars().all(is_safe_char) {
            return Err(TaskIdError::Unsafe(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TaskId::parse(s).map_err(serde::de::Error::custom)
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// One task document in a team's task directory.
///
/// Tasks are created by the team lead and mutated only by their owning
/// worker. Fields this worker version does not model are preserved across
/// updates by the store's merge-on-write, so the struct only needs the
/// fields the bridge reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub owner: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub blocked_by: Vec<TaskId>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Worker name written during the claim dance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    /// Claim time, epoch millis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<u64>,
    /// Pid of the claiming daemon, for detecting stale restarts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_pid: Option<u32>,
}

/// Sidecar document recording execution failures for one task.
///
/// Created on the first failure, incremented on each subsequent one,
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFailure {
    pub error: String,
    pub attempts: u32,
    pub last_failed_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
