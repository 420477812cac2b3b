// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and helpers for tests in this crate and downstream crates.

use crate::task::{Task, TaskId, TaskStatus};

/// Builder for task documents in tests.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: &str, owner: &str) -> Self {
        #[allow(clippy::expect_used)]
        let id = TaskId::parse(id).expect("valid test task id");
        Self {
            task: Task {
                id,
                subject: "test task".to_string(),
                description: String::new(),
                owner: owner.to_string(),
                status: TaskStatus::Pending,
                blocked_by: Vec::new(),
                metadata: serde_json::Map::new(),
                claimed_by: None,
                claimed_at: None,
                claim_pid: None,
            },
        }
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.task.subject = subject.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.task.description = description.to_string();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn blocked_by(mut self, ids: &[&str]) -> Self {
        #[allow(clippy::expect_used)]
        {
            self.task.blocked_by = ids
                .iter()
                .map(|id| TaskId::parse(*id).expect("valid test blocker id"))
                .collect();
        }
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
