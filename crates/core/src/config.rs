// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker bridge configuration.

use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration document passed to `omcd --config`.
///
/// Field names on disk are camelCase; the lead side writes these files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    pub team_name: String,
    pub worker_name: String,
    pub provider: Provider,
    pub working_directory: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    #[serde(default = "default_outbox_max_lines")]
    pub outbox_max_lines: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    3_000
}

fn default_task_timeout_ms() -> u64 {
    600_000
}

fn default_max_consecutive_errors() -> u32 {
    3
}

fn default_outbox_max_lines() -> usize {
    500
}

fn default_max_retries() -> u32 {
    5
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
