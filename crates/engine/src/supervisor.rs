// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider CLI supervision.
//!
//! Spawns the provider child, feeds the prompt on stdin, accumulates
//! stdout/stderr into bounded buffers, and races completion against the
//! task timeout and external termination. The handle/result split lets
//! the bridge kill the child while something else awaits the outcome.

use crate::parse::parse_response;
use omc_core::Provider;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Ceiling on accumulated stdout and stderr, each. Excess is drained and
/// dropped so a runaway child can neither exhaust memory nor block on a
/// full pipe.
pub const OUTPUT_CEILING_BYTES: usize = 10 * 1024 * 1024;

/// Characters of stderr carried into a failure error.
const STDERR_ERROR_CHARS: usize = 2_000;

const DEFAULT_TERM_GRACE_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn {provider}: {source}")]
    Spawn {
        provider: Provider,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write prompt to {provider} stdin: {source}")]
    Stdin {
        provider: Provider,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait on {provider}: {source}")]
    Wait {
        provider: Provider,
        #[source]
        source: std::io::Error,
    },

    #[error("{provider} timed out after {timeout_ms} ms")]
    Timeout { provider: Provider, timeout_ms: u64 },

    #[error("{provider} exited with {code:?} and produced no output: {stderr}")]
    Failed {
        provider: Provider,
        code: Option<i32>,
        stderr: String,
    },

    #[error("terminated before completion")]
    Terminated,

    #[error("supervisor task failed: {0}")]
    Internal(String),
}

/// One provider invocation.
#[derive(Debug, Clone)]
pub struct CliInvocation {
    pub provider: Provider,
    pub prompt: String,
    pub model: Option<String>,
    pub working_directory: PathBuf,
    pub timeout: Duration,
}

/// Lifetime control over a running child, detached from its result.
#[derive(Debug, Clone)]
pub struct CliHandle {
    pid: Option<u32>,
    cancel: CancellationToken,
}

impl CliHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the child to stop. The supervisor sends SIGTERM, waits out a
    /// grace period, and escalates to SIGKILL; the result resolves with
    /// [`SupervisorError::Terminated`].
    pub fn terminate(&self) {
        self.cancel.cancel();
    }
}

/// A spawned invocation: the handle plus the pending result.
#[derive(Debug)]
pub struct CliExecution {
    pub handle: CliHandle,
    pub result: JoinHandle<Result<String, SupervisorError>>,
}

/// Build the provider command line.
///
/// `OMC_CODEX_BIN` / `OMC_GEMINI_BIN` override the binary, which is how
/// tests substitute stub scripts.
pub fn provider_command(provider: Provider, model: Option<&str>) -> Command {
    let binary = provider_binary(provider);
    let mut command = Command::new(binary);
    match provider {
        Provider::Codex => {
            command.arg("exec");
            if let Some(model) = model {
                command.args(["-m", model]);
            }
            command.args(["--json", "--full-auto"]);
        }
        Provider::Gemini => {
            command.arg("--yolo");
            if let Some(model) = model {
                command.args(["--model", model]);
            }
        }
    }
    command
}

fn provider_binary(provider: Provider) -> String {
    let var = match provider {
        Provider::Codex => "OMC_CODEX_BIN",
        Provider::Gemini => "OMC_GEMINI_BIN",
    };
    std::env::var(var).unwrap_or_else(|_| provider.as_str().to_string())
}

fn term_grace() -> Duration {
    std::env::var("OMC_TERM_GRACE_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_TERM_GRACE_MS))
}

/// Spawn the provider child and its supervising task.
pub fn spawn(invocation: CliInvocation) -> Result<CliExecution, SupervisorError> {
    let CliInvocation { provider, prompt, model, working_directory, timeout } = invocation;
    let mut command = provider_command(provider, model.as_deref());
    command
        .current_dir(&working_directory)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let child = command.spawn().map_err(|e| SupervisorError::Spawn { provider, source: e })?;
    let pid = child.id();
    info!(%provider, pid, "provider child spawned");

    let cancel = CancellationToken::new();
    let handle = CliHandle { pid, cancel: cancel.clone() };
    let result = tokio::spawn(supervise(child, provider, prompt, timeout, cancel));
    Ok(CliExecution { handle, result })
}

async fn supervise(
    mut child: Child,
    provider: Provider,
    prompt: String,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<String, SupervisorError> {
    let pid = child.id();
    let timeout_ms = timeout.as_millis() as u64;
    let deadline = tokio::time::Instant::now() + timeout;

    let Some(mut stdin) = child.stdin.take() else {
        let _ = child.kill().await;
        return Err(SupervisorError::Internal("child stdin not piped".to_string()));
    };
    // Readers start before the prompt is fed so a chatty child never
    // deadlocks against a full stdout pipe.
    let stdout_task = child.stdout.take().map(|r| tokio::spawn(read_capped(r)));
    let stderr_task = child.stderr.take().map(|r| tokio::spawn(read_capped(r)));

    let fed = tokio::select! {
        res = async {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await
        } => res,
        _ = tokio::time::sleep_until(deadline) => {
            terminate_then_kill(&mut child, pid).await;
            return Err(SupervisorError::Timeout { provider, timeout_ms });
        }
        _ = cancel.cancelled() => {
            terminate_then_kill(&mut child, pid).await;
            return Err(SupervisorError::Terminated);
        }
    };
    drop(stdin);
    if let Err(e) = fed {
        terminate_then_kill(&mut child, pid).await;
        return Err(SupervisorError::Stdin { provider, source: e });
    }

    let status = tokio::select! {
        status = child.wait() => {
            status.map_err(|e| SupervisorError::Wait { provider, source: e })?
        }
        _ = tokio::time::sleep_until(deadline) => {
            terminate_then_kill(&mut child, pid).await;
            return Err(SupervisorError::Timeout { provider, timeout_ms });
        }
        _ = cancel.cancelled() => {
            terminate_then_kill(&mut child, pid).await;
            return Err(SupervisorError::Terminated);
        }
    };

    let stdout_buf = match stdout_task {
        Some(task) => task.await.unwrap_or_default(),
        None => Vec::new(),
    };
    let stderr_buf = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => Vec::new(),
    };
    let stdout_text = String::from_utf8_lossy(&stdout_buf);
    debug!(%provider, code = ?status.code(), stdout_bytes = stdout_buf.len(), "provider child exited");

    // Non-zero exits with usable stdout still count as success: the CLIs
    // sometimes report a failing exit after producing a complete answer.
    if status.success() || !stdout_text.trim().is_empty() {
        Ok(parse_response(provider, &stdout_text))
    } else {
        let stderr_text: String = String::from_utf8_lossy(&stderr_buf)
            .trim()
            .chars()
            .take(STDERR_ERROR_CHARS)
            .collect();
        Err(SupervisorError::Failed { provider, code: status.code(), stderr: stderr_text })
    }
}

async fn terminate_then_kill(child: &mut Child, pid: Option<u32>) {
    send_sigterm(pid);
    if tokio::time::timeout(term_grace(), child.wait()).await.is_err() {
        let _ = child.kill().await;
    }
}

fn send_sigterm(pid: Option<u32>) {
    if let Some(pid) = pid {
        let _ = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            nix::sys::signal::Signal::SIGTERM,
        );
    }
}

/// Accumulate a stream up to the output ceiling, draining the rest.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = OUTPUT_CEILING_BYTES.saturating_sub(buf.len());
                let take = n.min(room);
                buf.extend_from_slice(&chunk[..take]);
            }
        }
    }
    buf
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
