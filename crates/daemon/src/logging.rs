// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File logging under the state root.

use omc_core::BridgeConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with a per-worker log file under `<state>/logs/`.
///
/// Returns the appender guard; dropping it flushes buffered log lines.
/// Returns `None` when the logs directory cannot be created or a
/// subscriber is already installed (tests) — the daemon runs unlogged
/// rather than not at all.
pub fn init(state_root: &Path, config: &BridgeConfig) -> Option<WorkerGuard> {
    let logs_dir = state_root.join("logs");
    if let Err(e) = std::fs::create_dir_all(&logs_dir) {
        eprintln!("omcd: cannot create log directory {}: {}", logs_dir.display(), e);
        return None;
    }
    let appender = tracing_appender::rolling::never(
        &logs_dir,
        format!("omcd-{}-{}.log", config.team_name, config.worker_name),
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(crate::env::LOG_FILTER_VAR)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    initialized.ok().map(|_| guard)
}
