// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn gemini_output_is_trimmed_passthrough() {
    assert_eq!(parse_response(Provider::Gemini, "  done\n\n"), "done");
}

#[test]
fn codex_collects_agent_messages_from_completed_items() {
    let stdout = concat!(
        r#"{"type":"item.started","item":{"type":"agent_message"}}"#,
        "\n",
        r#"{"type":"item.completed","item":{"type":"agent_message","text":"first"}}"#,
        "\n",
        r#"{"type":"item.completed","item":{"type":"command_execution","text":"ls"}}"#,
        "\n",
        r#"{"type":"item.completed","item":{"type":"agent_message","text":"second"}}"#,
        "\n",
    );
    assert_eq!(parse_response(Provider::Codex, stdout), "first\nsecond");
}

#[test]
fn codex_collects_message_and_output_text_records() {
    let stdout = concat!(
        r#"{"type":"message","text":"hello"}"#,
        "\n",
        r#"{"type":"output_text","text":"world"}"#,
        "\n",
    );
    assert_eq!(parse_response(Provider::Codex, stdout), "hello\nworld");
}

#[test]
fn codex_skips_undecodable_lines_silently() {
    let stdout = concat!(
        "warning: something on stderr leaked here\n",
        r#"{"type":"item.completed","item":{"type":"agent_message","text":"kept"}}"#,
        "\n",
        "{broken json\n",
    );
    assert_eq!(parse_response(Provider::Codex, stdout), "kept");
}

#[test]
fn codex_falls_back_to_raw_stdout_when_nothing_extracted() {
    assert_eq!(parse_response(Provider::Codex, "plain text answer\n"), "plain text answer");
    let events_without_text = r#"{"type":"turn.completed","usage":{}}"#;
    assert_eq!(parse_response(Provider::Codex, events_without_text), events_without_text);
}

#[test]
fn codex_ignores_records_missing_text_fields() {
    let stdout = concat!(
        r#"{"type":"message"}"#,
        "\n",
        r#"{"type":"item.completed","item":{"type":"agent_message"}}"#,
        "\n",
        r#"{"type":"message","text":"only this"}"#,
        "\n",
    );
    assert_eq!(parse_response(Provider::Codex, stdout), "only this");
}
