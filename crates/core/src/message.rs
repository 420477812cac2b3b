// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox and outbox message records.
//!
//! Both logs are newline-delimited JSON, one document per line. The inbox
//! is appended by the team lead and only read here; the outbox is the
//! reverse. Consumers of the outbox must ignore `type` tags they do not
//! know so new variants can be added without breaking older leads.

use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message from the team lead.
///
/// The `type` tag is free-form from the worker's perspective: unknown kinds
/// are still delivered as context rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Worker-to-lead status messages, discriminated on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboxMessage {
    TaskComplete {
        task_id: TaskId,
        summary: String,
        timestamp: DateTime<Utc>,
    },
    TaskFailed {
        task_id: TaskId,
        error: String,
        attempt: u32,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Idle {
        message: String,
        timestamp: DateTime<Utc>,
    },
    ShutdownAck {
        request_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl OutboxMessage {
    /// The `type` discriminator this message serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboxMessage::TaskComplete { .. } => "task_complete",
            OutboxMessage::TaskFailed { .. } => "task_failed",
            OutboxMessage::Error { .. } => "error",
            OutboxMessage::Idle { .. } => "idle",
            OutboxMessage::ShutdownAck { .. } => "shutdown_ack",
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
