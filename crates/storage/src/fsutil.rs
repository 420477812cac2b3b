// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file primitives.
//!
//! Single-document files are written to a temp name in the target
//! directory and renamed into place, so readers in other processes never
//! observe a partial document. Files are 0o600 and directories 0o700:
//! the fabric relies on owner-only permissions instead of locking.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const FILE_MODE: u32 = 0o600;
pub const DIR_MODE: u32 = 0o700;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path has no parent directory: {0}")]
    NoParent(PathBuf),

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FsError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        FsError::Io { path: path.to_path_buf(), source }
    }
}

/// Current epoch time in milliseconds.
pub fn epoch_ms_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Create a directory tree with owner-only permissions.
pub fn create_dir_private(dir: &Path) -> Result<(), FsError> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
        .map_err(|e| FsError::io(dir, e))
}

/// Write a file atomically: temp file in the same directory, then rename.
///
/// The temp name is qualified by pid and millisecond timestamp so two
/// workers writing the same target never collide on the temp path.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FsError> {
    let parent = path.parent().ok_or_else(|| FsError::NoParent(path.to_path_buf()))?;
    create_dir_private(parent)?;
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = parent.join(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        epoch_ms_now()
    ));
    let write = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(FILE_MODE)
            .open(&tmp)?;
        file.write_all(contents)?;
        file.flush()
    })();
    if let Err(e) = write {
        let _ = fs::remove_file(&tmp);
        return Err(FsError::io(&tmp, e));
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        FsError::io(path, e)
    })
}

/// Write one pretty-printed JSON document plus a trailing newline.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), FsError> {
    let mut contents = serde_json::to_vec_pretty(value)?;
    contents.push(b'\n');
    write_atomic(path, &contents)
}

/// Append one line to a log file, creating it (and its directory) if needed.
pub fn append_line(path: &Path, line: &str) -> Result<(), FsError> {
    let parent = path.parent().ok_or_else(|| FsError::NoParent(path.to_path_buf()))?;
    create_dir_private(parent)?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .mode(FILE_MODE)
        .open(path)
        .map_err(|e| FsError::io(path, e))?;
    file.write_all(line.as_bytes()).map_err(|e| FsError::io(path, e))?;
    file.write_all(b"\n").map_err(|e| FsError::io(path, e))
}

#[cfg(test)]
#[path = "fsutil_tests.rs"]
mod tests;
