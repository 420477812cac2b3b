// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider response framing.
//!
//! gemini prints plain text. codex streams one JSON event per stdout
//! line; the response is the concatenated agent-message text. Lines that
//! fail to decode are skipped: the stream interleaves human-readable
//! noise with events on some versions.

use omc_core::Provider;
use serde_json::Value;

/// Extract the response text from a provider's raw stdout.
pub fn parse_response(provider: Provider, stdout: &str) -> String {
    match provider {
        Provider::Gemini => stdout.trim().to_string(),
        Provider::Codex => parse_codex_stream(stdout),
    }
}

fn parse_codex_stream(stdout: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(event) = serde_json::from_str::<Value>(line) else { continue };
        match event.get("type").and_then(Value::as_str) {
            Some("item.completed") => {
                let item = event.get("item");
                let is_agent_message = item
                    .and_then(|i| i.get("type"))
                    .and_then(Value::as_str)
                    == Some("agent_message");
                if is_agent_message {
                    if let Some(text) = item.and_then(|i| i.get("text")).and_then(Value::as_str) {
                        parts.push(text.to_string());
                    }
                }
            }
            Some("message") | Some("output_text") => {
                if let Some(text) = event.get("text").and_then(Value::as_str) {
                    parts.push(text.to_string());
                }
            }
            _ => {}
        }
    }
    if parts.is_empty() {
        stdout.trim().to_string()
    } else {
        parts.join("\n")
    }
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
