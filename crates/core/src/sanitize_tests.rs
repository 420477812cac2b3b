// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "backend", "backend" },
    mixed_case_kept = { "Backend-Team", "Backend-Team" },
    dots_and_underscores_kept = { "w_1.alpha", "w_1.alpha" },
    spaces_become_hyphens = { "my team", "my-team" },
    runs_collapse = { "a//b\\\\c", "a-b-c" },
    literal_hyphen_runs_collapse = { "a--b", "a-b" },
    trimmed = { "  edge  ", "edge" },
    unicode_replaced = { "équipe", "quipe" },
    shell_metacharacters = { "a;rm -rf /", "a-rm-rf" },
)]
fn sanitizes(input: &str, expected: &str) {
    assert_eq!(sanitize_name(input).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    only_unsafe = { "!!!" },
    only_hyphens = { "---" },
    whitespace = { "   " },
)]
fn rejects_empty_results(input: &str) {
    assert_eq!(
        sanitize_name(input),
        Err(SanitizeError::Empty(input.to_string()))
    );
}

#[test]
fn traversal_components_are_neutralized() {
    assert_eq!(sanitize_name("../../etc/passwd").unwrap(), "..-..-etc-passwd");
}

#[parameterized(
    dot = { "." },
    dot_dot = { ".." },
    dot_run = { "...." },
    dots_after_trim = { "-..-" },
)]
fn rejects_dot_only_names(input: &str) {
    assert_eq!(
        sanitize_name(input),
        Err(SanitizeError::Unsafe(input.to_string()))
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn idempotent(input in ".*") {
            if let Ok(once) = sanitize_name(&input) {
                prop_assert_eq!(sanitize_name(&once).unwrap(), once);
            }
        }

        #[test]
        fn output_is_safe(input in ".*") {
            if let Ok(name) = sanitize_name(&input) {
                prop_assert!(name.chars().all(is_safe_char));
                prop_assert!(!name.starts_with('-') && !name.ends_with('-'));
                prop_assert!(!name.contains("--"));
            }
        }
    }
}
