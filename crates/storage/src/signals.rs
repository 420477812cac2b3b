// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown signal files and worker heartbeats.

use crate::fsutil::{self, FsError};
use crate::paths::FabricLayout;
use omc_core::{Heartbeat, ShutdownSignal};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One worker's view of the signal plane: its shutdown-request file and
/// its heartbeat document.
#[derive(Debug, Clone)]
pub struct SignalPlane {
    signal_path: PathBuf,
    heartbeat_path: PathBuf,
}

impl SignalPlane {
    pub fn new(layout: &FabricLayout, working_directory: &Path, team: &str, worker: &str) -> Self {
        let key = heartbeat_key(working_directory, team, worker);
        Self {
            signal_path: layout.shutdown_signal_path(team, worker),
            heartbeat_path: layout.heartbeats_dir().join(format!("{}.json", key)),
        }
    }

    pub fn signal_path(&self) -> &Path {
        &self.signal_path
    }

    pub fn heartbeat_path(&self) -> &Path {
        &self.heartbeat_path
    }

    /// A pending shutdown request, if any.
    ///
    /// A signal file that fails to decode still reads as a request: the
    /// worker must not keep running because the kill order was garbled.
    pub fn read_shutdown(&self) -> Option<ShutdownSignal> {
        let raw = match fs::read_to_string(&self.signal_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.signal_path.display(), error = %e, "unreadable shutdown signal");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!(error = %e, "malformed shutdown signal; treating as shutdown");
                Some(ShutdownSignal::default())
            }
        }
    }

    /// Remove an acked shutdown request.
    pub fn clear_shutdown(&self) -> Result<(), FsError> {
        match fs::remove_file(&self.signal_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError::io(&self.signal_path, e)),
        }
    }

    pub fn write_heartbeat(&self, heartbeat: &Heartbeat) -> Result<(), FsError> {
        fsutil::write_json_pretty(&self.heartbeat_path, heartbeat)
    }

    pub fn clear_heartbeat(&self) -> Result<(), FsError> {
        match fs::remove_file(&self.heartbeat_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError::io(&self.heartbeat_path, e)),
        }
    }
}

/// Heartbeats are keyed by (working directory, team, worker): the same
/// worker name may run in different checkouts, and each run gets its own
/// liveness document.
fn heartbeat_key(working_directory: &Path, team: &str, worker: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(working_directory.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    let prefix: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}-{}", prefix, team, worker)
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
