// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown signals and worker heartbeats.

use crate::provider::Provider;
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A shutdown request written by the team lead.
///
/// Every field defaults so that a malformed or partial signal document
/// still reads as a shutdown request; the worker acks with whatever
/// request id it could recover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShutdownSignal {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Lifecycle state advertised in a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Polling,
    Executing,
    Quarantined,
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerStatus::Polling => "polling",
            WorkerStatus::Executing => "executing",
            WorkerStatus::Quarantined => "quarantined",
        };
        write!(f, "{}", s)
    }
}

/// Liveness document rewritten on every bridge cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub worker: String,
    pub team: String,
    pub provider: Provider,
    pub pid: u32,
    pub last_poll_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<TaskId>,
    pub consecutive_errors: u32,
    pub status: WorkerStatus,
}
