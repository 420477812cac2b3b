// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bridge scheduling loop.
//!
//! One logical thread of control: check for shutdown, heartbeat, read the
//! inbox, claim a task, run the provider, report to the outbox, sleep.
//! Task execution failures feed a retry budget per task and a
//! consecutive-error budget per daemon; the latter parks the daemon in
//! quarantine until an external shutdown releases it.

use crate::prompt::build_prompt;
use crate::supervisor::{self, CliExecution, CliHandle, CliInvocation, SupervisorError};
use omc_core::{
    BridgeConfig, Clock, InboxMessage, OutboxMessage, SanitizeError, ShutdownSignal, SystemClock,
    Task, TaskId, TaskStatus, WorkerStatus,
};
use omc_storage::fsutil::{self, FsError};
use omc_storage::{
    FabricLayout, Inbox, MailboxError, Outbox, Selection, SignalPlane, TaskStore, TaskStoreError,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Characters of CLI output quoted in a `task_complete` summary.
const SUMMARY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    #[error(transparent)]
    Tasks(#[from] TaskStoreError),

    #[error(transparent)]
    Mailbox(#[from] MailboxError),

    #[error(transparent)]
    Fs(#[from] FsError),
}

/// What one scheduling pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Executed or retired a task.
    Worked,
    /// Nothing claimable.
    Idle,
    /// Parked; the caller should back off harder.
    Quarantined,
    /// The shutdown sequence ran; the loop must exit.
    Shutdown,
}

enum ExecWait {
    Finished(Result<String, SupervisorError>),
    Shutdown(ShutdownSignal),
}

/// One worker's bridge daemon.
pub struct Bridge<C: Clock = SystemClock> {
    config: BridgeConfig,
    tasks: TaskStore<C>,
    inbox: Inbox,
    outbox: Outbox,
    signals: SignalPlane,
    clock: C,
    pid: u32,
    consecutive_errors: u32,
    idle_notified: bool,
    quarantine_notified: bool,
    live_child: Option<CliHandle>,
}

impl<C: Clock> Bridge<C> {
    pub fn new(
        mut config: BridgeConfig,
        state_root: PathBuf,
        clock: C,
    ) -> Result<Self, BridgeError> {
        config.team_name = omc_core::sanitize_name(&config.team_name)?;
        config.worker_name = omc_core::sanitize_name(&config.worker_name)?;
        let layout = FabricLayout::new(state_root);
        let pid = std::process::id();
        let tasks = TaskStore::new(
            layout.team_tasks_dir(&config.team_name),
            config.worker_name.clone(),
            pid,
            config.max_retries,
            clock.clone(),
        )?;
        let inbox = Inbox::new(layout.inbox_path(&config.team_name, &config.worker_name));
        let outbox = Outbox::new(layout.outbox_path(&config.team_name, &config.worker_name));
        let signals = SignalPlane::new(
            &layout,
            &config.working_directory,
            &config.team_name,
            &config.worker_name,
        );
        Ok(Self {
            config,
            tasks,
            inbox,
            outbox,
            signals,
            clock,
            pid,
            consecutive_errors: 0,
            idle_notified: false,
            quarantine_notified: false,
            live_child: None,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Drive cycles until an external shutdown request arrives.
    ///
    /// Cycle errors are transient by definition here: they are logged,
    /// counted against the quarantine budget, and the loop resumes after
    /// one interval.
    pub async fn run(&mut self) -> Result<(), BridgeError> {
        info!(
            team = %self.config.team_name,
            worker = %self.config.worker_name,
            provider = %self.config.provider,
            pid = self.pid,
            "bridge daemon started"
        );
        loop {
            match self.cycle().await {
                Ok(CycleOutcome::Shutdown) => return Ok(()),
                Ok(CycleOutcome::Quarantined) => {
                    tokio::time::sleep(self.config.poll_interval() * 3).await;
                }
                Ok(_) => tokio::time::sleep(self.config.poll_interval()).await,
                Err(e) => {
                    warn!(error = %e, "cycle failed; continuing");
                    self.consecutive_errors += 1;
                    tokio::time::sleep(self.config.poll_interval()).await;
                }
            }
        }
    }

    /// One scheduling pass. Does not sleep; [`run`](Bridge::run) owns pacing.
    pub async fn cycle(&mut self) -> Result<CycleOutcome, BridgeError> {
        if let Some(signal) = self.signals.read_shutdown() {
            self.shutdown(signal).await;
            return Ok(CycleOutcome::Shutdown);
        }

        if self.consecutive_errors >= self.config.max_consecutive_errors {
            if !self.quarantine_notified {
                warn!(errors = self.consecutive_errors, "entering quarantine");
                self.outbox.append(&OutboxMessage::Error {
                    message: format!(
                        "Self-quarantined after {} consecutive errors; \
                         an external shutdown is required to release this worker",
                        self.consecutive_errors
                    ),
                    timestamp: self.clock.now_utc(),
                })?;
                self.quarantine_notified = true;
            }
            self.write_heartbeat(WorkerStatus::Quarantined, None)?;
            return Ok(CycleOutcome::Quarantined);
        }

        self.write_heartbeat(WorkerStatus::Polling, None)?;
        let inbox_messages = self.inbox.read_new()?;
        if !inbox_messages.is_empty() {
            debug!(count = inbox_messages.len(), "inbox messages received");
        }

        let outcome = match self.tasks.next_task().await? {
            Selection::Claimed(task) => {
                self.idle_notified = false;
                self.execute(task, &inbox_messages).await?
            }
            Selection::Exhausted { task, failure } => {
                self.idle_notified = false;
                self.retire(&task, &failure.error, failure.attempts)?;
                CycleOutcome::Worked
            }
            Selection::Empty => {
                if !self.idle_notified {
                    self.outbox.append(&OutboxMessage::Idle {
                        message: "no claimable tasks; polling".to_string(),
                        timestamp: self.clock.now_utc(),
                    })?;
                    self.idle_notified = true;
                }
                CycleOutcome::Idle
            }
        };
        if outcome == CycleOutcome::Shutdown {
            return Ok(outcome);
        }

        if let Err(e) = self.outbox.rotate(self.config.outbox_max_lines) {
            warn!(error = %e, "outbox rotation failed");
        }
        Ok(outcome)
    }

    async fn execute(
        &mut self,
        task: Task,
        inbox: &[InboxMessage],
    ) -> Result<CycleOutcome, BridgeError> {
        let id = task.id.clone();
        info!(task = %id, "executing task");
        self.tasks.set_status(&id, TaskStatus::InProgress)?;
        self.write_heartbeat(WorkerStatus::Executing, Some(&id))?;

        // A shutdown may have landed while the task was being selected;
        // give it back before spawning anything.
        if let Some(signal) = self.signals.read_shutdown() {
            self.revert_to_pending(&id);
            self.shutdown(signal).await;
            return Ok(CycleOutcome::Shutdown);
        }

        let prompt = build_prompt(&task, inbox, &self.config);
        let stem = format!(
            "team-{}-task-{}-{}",
            self.config.team_name,
            id,
            self.clock.epoch_ms()
        );
        let omc_dir = self.config.working_directory.join(".omc");
        fsutil::write_atomic(&omc_dir.join("prompts").join(&stem), prompt.as_bytes())?;
        let output_path = omc_dir.join("outputs").join(&stem);

        let invocation = CliInvocation {
            provider: self.config.provider,
            prompt,
            model: self.config.model.clone(),
            working_directory: self.config.working_directory.clone(),
            timeout: self.config.task_timeout(),
        };
        let result = match supervisor::spawn(invocation) {
            Ok(execution) => {
                self.live_child = Some(execution.handle.clone());
                let wait = self.await_cli(execution).await;
                self.live_child = None;
                match wait {
                    ExecWait::Finished(result) => result,
                    ExecWait::Shutdown(signal) => {
                        self.revert_to_pending(&id);
                        self.shutdown(signal).await;
                        return Ok(CycleOutcome::Shutdown);
                    }
                }
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                fsutil::write_atomic(&output_path, response.as_bytes())?;
                self.tasks.set_status(&id, TaskStatus::Completed)?;
                self.consecutive_errors = 0;
                let summary: String = response.chars().take(SUMMARY_CHARS).collect();
                self.outbox.append(&OutboxMessage::TaskComplete {
                    task_id: id.clone(),
                    summary,
                    timestamp: self.clock.now_utc(),
                })?;
                info!(task = %id, output = %output_path.display(), "task complete");
            }
            Err(error) => {
                self.consecutive_errors += 1;
                let error_text = error.to_string();
                warn!(task = %id, error = %error_text, "task execution failed");
                let failure = self.tasks.record_failure(&id, &error_text)?;
                if failure.attempts > self.config.max_retries {
                    self.retire(&task, &error_text, failure.attempts)?;
                } else {
                    self.tasks.set_status(&id, TaskStatus::Pending)?;
                    self.outbox.append(&OutboxMessage::TaskFailed {
                        task_id: id.clone(),
                        error: error_text,
                        attempt: failure.attempts,
                        timestamp: self.clock.now_utc(),
                    })?;
                }
            }
        }

        let status = if self.consecutive_errors >= self.config.max_consecutive_errors {
            WorkerStatus::Quarantined
        } else {
            WorkerStatus::Polling
        };
        self.write_heartbeat(status, None)?;
        Ok(CycleOutcome::Worked)
    }

    /// Mark a task permanently failed: completed with failure metadata,
    /// plus one `error` outbox entry. The task is never run again.
    fn retire(&mut self, task: &Task, error: &str, attempts: u32) -> Result<(), BridgeError> {
        let mut metadata = task.metadata.clone();
        metadata.insert("error".to_string(), json!(error));
        metadata.insert("permanentlyFailed".to_string(), json!(true));
        metadata.insert("failedAttempts".to_string(), json!(attempts));
        self.tasks.update(
            &task.id,
            json!({ "status": TaskStatus::Completed, "metadata": metadata }),
        )?;
        self.outbox.append(&OutboxMessage::Error {
            message: format!(
                "Task {} permanently failed after {} attempts: {}",
                task.id, attempts, error
            ),
            timestamp: self.clock.now_utc(),
        })?;
        warn!(task = %task.id, attempts, "task permanently failed");
        Ok(())
    }

    /// Await the provider child while watching for an external shutdown.
    ///
    /// On shutdown the child is terminated through its handle (SIGTERM,
    /// grace period, SIGKILL) and the pending result is drained before
    /// reporting, so the sequence that follows never races a live child.
    async fn await_cli(&self, execution: CliExecution) -> ExecWait {
        let CliExecution { handle, mut result } = execution;
        let mut shutdown_seen: Option<ShutdownSignal> = None;
        loop {
            tokio::select! {
                joined = &mut result => {
                    let finished = match joined {
                        Ok(res) => res,
                        Err(e) => Err(SupervisorError::Internal(e.to_string())),
                    };
                    return match shutdown_seen {
                        Some(signal) => ExecWait::Shutdown(signal),
                        None => ExecWait::Finished(finished),
                    };
                }
                _ = tokio::time::sleep(self.config.poll_interval()), if shutdown_seen.is_none() => {
                    if let Some(signal) = self.signals.read_shutdown() {
                        info!("shutdown requested mid-task; terminating provider child");
                        handle.terminate();
                        shutdown_seen = Some(signal);
                    }
                }
            }
        }
    }

    fn revert_to_pending(&self, id: &TaskId) {
        if let Err(e) = self.tasks.set_status(id, TaskStatus::Pending) {
            warn!(task = %id, error = %e, "failed to revert task to pending");
        }
    }

    /// The ordered shutdown sequence. Every step is best-effort: a failed
    /// step is logged and the next one still runs.
    async fn shutdown(&mut self, signal: ShutdownSignal) {
        info!(
            request_id = %signal.request_id,
            reason = %signal.reason,
            "shutdown requested"
        );
        if let Some(handle) = self.live_child.take() {
            handle.terminate();
        }
        if let Err(e) = self.outbox.append(&OutboxMessage::ShutdownAck {
            request_id: signal.request_id,
            timestamp: self.clock.now_utc(),
        }) {
            warn!(error = %e, "failed to append shutdown ack");
        }
        if let Err(e) = self.signals.clear_shutdown() {
            warn!(error = %e, "failed to remove shutdown signal");
        }
        if let Err(e) = self.signals.clear_heartbeat() {
            warn!(error = %e, "failed to remove heartbeat");
        }
        self.kill_mux_session().await;
        info!("bridge daemon stopped");
    }

    /// Tear down this worker's multiplexer session. When the daemon runs
    /// inside that session, this takes the process down with it; outside
    /// one it fails quietly.
    async fn kill_mux_session(&self) {
        let session = format!("omc-{}-{}", self.config.team_name, self.config.worker_name);
        let _ = tokio::process::Command::new("tmux")
            .args(["kill-session", "-t", &session])
            .output()
            .await;
    }

    fn write_heartbeat(
        &self,
        status: WorkerStatus,
        current_task: Option<&TaskId>,
    ) -> Result<(), BridgeError> {
        let heartbeat = omc_core::Heartbeat {
            worker: self.config.worker_name.clone(),
            team: self.config.team_name.clone(),
            provider: self.config.provider,
            pid: self.pid,
            last_poll_at: self.clock.now_utc(),
            current_task_id: current_task.cloned(),
            consecutive_errors: self.consecutive_errors,
            status,
        };
        Ok(self.signals.write_heartbeat(&heartbeat)?)
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
