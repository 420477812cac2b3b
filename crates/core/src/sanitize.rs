// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name sanitization for fabric identifiers.
//!
//! Team names, worker names, and task ids all end up as filename components
//! and multiplexer session tokens, so they are reduced to a single safe
//! character class before any path is derived from them.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("name is empty after sanitization: {0:?}")]
    Empty(String),

    #[error("name is not usable as a path component: {0:?}")]
    Unsafe(String),
}

/// Characters allowed in team, worker, and task names.
pub fn is_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')
}

/// Reduce an untrusted name to the safe character class.
///
/// Replaces anything outside `[A-Za-z0-9._-]` with a hyphen, collapses
/// hyphen runs, and trims leading/trailing hyphens. Fails when nothing
/// survives. Idempotent: sanitizing a sanitized name is a no-op.
pub fn sanitize_name(input: &str) -> Result<String, SanitizeError> {
    let mut out = String::with_capacity(input.len());
    let mut last_was_hyphen = false;
    for ch in input.chars() {
        if is_safe_char(ch) && ch != '-' {
            out.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        return Err(SanitizeError::Empty(input.to_string()));
    }
    // "." and ".." survive the character class but are path traversal, not names
    if trimmed.chars().all(|c| c == '.') {
        return Err(SanitizeError::Unsafe(input.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
