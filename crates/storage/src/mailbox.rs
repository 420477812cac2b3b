// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only inbox/outbox message logs.
//!
//! One JSON document per line. The inbox is consumed through a persisted
//! byte-offset cursor that only ever advances past newline boundaries of
//! successfully decoded records; a malformed line halts advancement at
//! that boundary so the next read re-observes it.

use crate::fsutil::{self, FsError};
use omc_core::{InboxMessage, OutboxMessage};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on bytes consumed from the inbox in one read.
pub const INBOX_READ_WINDOW: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

impl MailboxError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        MailboxError::Io { path: path.to_path_buf(), source }
    }
}

/// Worker-to-lead log.
#[derive(Debug, Clone)]
pub struct Outbox {
    path: PathBuf,
}

impl Outbox {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, message: &OutboxMessage) -> Result<(), MailboxError> {
        let line = serde_json::to_string(message)?;
        fsutil::append_line(&self.path, &line)?;
        debug!(kind = message.kind(), "outbox append");
        Ok(())
    }

    /// Keep the most recent half when the log exceeds its line budget.
    pub fn rotate(&self, max_lines: usize) -> Result<(), MailboxError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(MailboxError::io(&self.path, e)),
        };
        let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() <= max_lines {
            return Ok(());
        }
        let keep = &lines[lines.len() / 2..];
        let mut contents = keep.join("\n");
        contents.push('\n');
        fsutil::write_atomic(&self.path, contents.as_bytes())?;
        debug!(dropped = lines.len() - keep.len(), kept = keep.len(), "outbox rotated");
        Ok(())
    }
}

/// Lead-to-worker log with its byte-offset cursor.
#[derive(Debug, Clone)]
pub struct Inbox {
    path: PathBuf,
    cursor_path: PathBuf,
}

impl Inbox {
    pub fn new(path: PathBuf) -> Self {
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let cursor_path = path.with_file_name(format!("{}.offset", file_name));
        Self { path, cursor_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The persisted cursor; absent or corrupt reads as zero.
    pub fn cursor(&self) -> u64 {
        fs::read_to_string(&self.cursor_path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    fn write_cursor(&self, offset: u64) -> Result<(), MailboxError> {
        Ok(fsutil::write_atomic(&self.cursor_path, offset.to_string().as_bytes())?)
    }

    /// Read and deliver messages appended since the last call.
    ///
    /// A file smaller than the cursor means the lead rotated or truncated
    /// it; the cursor resets to zero and reading restarts from the top. At
    /// most [`INBOX_READ_WINDOW`] bytes are consumed per call. An
    /// unterminated final line is left for a later read: the lead may
    /// still be mid-append.
    pub fn read_new(&self) -> Result<Vec<InboxMessage>, MailboxError> {
        let mut cursor = self.cursor();
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MailboxError::io(&self.path, e)),
        };
        if len < cursor {
            debug!(cursor, len, "inbox shrank; resetting cursor");
            cursor = 0;
        }
        if len == cursor {
            return Ok(Vec::new());
        }

        let pending = len - cursor;
        if pending > INBOX_READ_WINDOW as u64 {
            warn!(pending, "inbox backlog exceeds read window; reading partial");
        }
        let window = pending.min(INBOX_READ_WINDOW as u64);
        let mut file = File::open(&self.path).map_err(|e| MailboxError::io(&self.path, e))?;
        file.seek(SeekFrom::Start(cursor)).map_err(|e| MailboxError::io(&self.path, e))?;
        let mut buf = Vec::with_capacity(window as usize);
        file.take(window)
            .read_to_end(&mut buf)
            .map_err(|e| MailboxError::io(&self.path, e))?;

        let mut messages = Vec::new();
        let mut consumed = 0usize;
        let mut pos = 0usize;
        while let Some(nl) = buf[pos..].iter().position(|&b| b == b'\n') {
            let line_end = pos + nl;
            let next = line_end + 1;
            let Ok(text) = std::str::from_utf8(&buf[pos..line_end]) else {
                debug!(offset = cursor + pos as u64, "undecodable inbox line; halting cursor");
                break;
            };
            let text = text.trim();
            if text.is_empty() {
                consumed = next;
                pos = next;
                continue;
            }
            match serde_json::from_str::<InboxMessage>(text) {
                Ok(message) => {
                    messages.push(message);
                    consumed = next;
                    pos = next;
                }
                Err(e) => {
                    debug!(offset = cursor + pos as u64, error = %e, "malformed inbox line; halting cursor");
                    break;
                }
            }
        }

        self.write_cursor(cursor + consumed as u64)?;
        Ok(messages)
    }

    /// External maintenance: shrink an oversized inbox.
    ///
    /// Keeps the most recent half at a line boundary and resets the cursor
    /// to zero, which the next read treats as the truncation case.
    pub fn rotate(&self, max_bytes: u64) -> Result<(), MailboxError> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(MailboxError::io(&self.path, e)),
        };
        if len <= max_bytes {
            return Ok(());
        }
        let raw = fs::read(&self.path).map_err(|e| MailboxError::io(&self.path, e))?;
        let half = raw.len() / 2;
        let start = raw[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|nl| half + nl + 1)
            .unwrap_or(raw.len());
        fsutil::write_atomic(&self.path, &raw[start..])?;
        self.write_cursor(0)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
