// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.

use crate::config::ConfigError;
use std::path::PathBuf;

/// Resolve the state root: OMC_STATE_DIR > XDG_STATE_HOME/omc > ~/.local/state/omc
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("OMC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("omc"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/omc"))
}

/// Log filter env var name (tracing env-filter syntax, default "info").
pub const LOG_FILTER_VAR: &str = "OMC_LOG";
