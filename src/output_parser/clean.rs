//! Response cleaning: isolate the structured payload inside raw model text.
//!
//! [`clean`] is the entry point for the structured-list shape and
//! [`clean_lines`] for the delimited-line shape. Both are pure and idempotent.

use crate::output_parser::error::{truncate, ParseError};
use crate::output_parser::extract::{find_list_bounds, strip_code_fence, strip_think_tags};
use crate::output_parser::repair::{remove_trailing_commas, strip_comments, strip_stray_fragments};

/// Clean a raw model response down to a candidate JSON list.
///
/// Passes (in order):
/// 1. Strip `<think>` blocks
/// 2. Strip an enclosing code fence, keeping the inner content
/// 3. Cut to the first `[` through the last `]`
/// 4. Strip comments, then trailing commas
/// 5. Only if the text still does not decode: strip stray prose and dangling
///    keys, keeping that result only when it decodes
///
/// The passes run until the text stops changing, so
/// `clean(&clean(x)?) == clean(x)`.
///
/// # Examples
///
/// ```
/// use trivia_forge::output_parser::clean;
///
/// let raw = "Sure!\n```json\n[{\"question\": \"Q?\",},]\n```";
/// assert_eq!(clean(raw).unwrap(), "[{\"question\": \"Q?\"}]");
/// ```
pub fn clean(raw: &str) -> Result<String, ParseError> {
    let mut current = clean_once(raw)?;
    // A changing pass either only deletes text or yields a list that decodes,
    // and a decoding list passes through unchanged, so this settles.
    while let Ok(next) = clean_once(&current) {
        if next == current {
            break;
        }
        current = next;
    }
    Ok(current)
}

fn clean_once(raw: &str) -> Result<String, ParseError> {
    let without_think = strip_think_tags(raw);
    let text = strip_code_fence(&without_think);
    if text.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let list = find_list_bounds(text).ok_or_else(|| ParseError::MissingListBoundary {
        text: truncate(text, 200),
    })?;

    let primary = remove_trailing_commas(&strip_comments(list));
    if decodes(&primary) {
        return Ok(primary);
    }

    let stripped = remove_trailing_commas(&strip_stray_fragments(&primary));
    if stripped != primary && decodes(&stripped) {
        tracing::debug!("stray fragments stripped from model output");
        Ok(stripped)
    } else {
        Ok(primary)
    }
}

/// Clean a raw model response for line-oriented parsing.
///
/// Strips `<think>` blocks and an enclosing code fence; no list boundary is
/// required.
pub fn clean_lines(raw: &str) -> Result<String, ParseError> {
    let without_think = strip_think_tags(raw);
    let text = strip_code_fence(&without_think);
    if text.is_empty() {
        return Err(ParseError::EmptyResponse);
    }
    Ok(text.to_string())
}

fn decodes(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[{"question": "Q?", "options": ["a", "b", "c", "d"], "correctAnswer": "a"}]"#;

    #[test]
    fn clean_passthrough_for_valid_list() {
        assert_eq!(clean(VALID).unwrap(), VALID);
    }

    #[test]
    fn clean_strips_fence_and_prose() {
        let raw = format!("Here are your questions!\n```json\n{}\n```\nEnjoy the game.", VALID);
        assert_eq!(clean(&raw).unwrap(), VALID);
    }

    #[test]
    fn clean_strips_think_block() {
        let raw = format!("<think>let me come up with some</think>{}", VALID);
        assert_eq!(clean(&raw).unwrap(), VALID);
    }

    #[test]
    fn clean_removes_placeholder_comment_and_trailing_comma() {
        let raw = "[\n  {\"question\": \"Q?\"},\n  // ... more questions\n]";
        let cleaned = clean(raw).unwrap();
        assert!(decodes(&cleaned), "got {cleaned}");
    }

    #[test]
    fn clean_strips_dangling_prose_in_object() {
        let raw = r#"[{"question": "Q?", "correctAnswer": "a" (I hope that's right!)}]"#;
        let cleaned = clean(raw).unwrap();
        let v: serde_json::Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(v[0]["correctAnswer"], "a");
    }

    #[test]
    fn clean_keeps_undecodable_text_for_parser_to_reject() {
        let raw = r#"[{"question": "unterminated]"#;
        let cleaned = clean(raw).unwrap();
        assert!(!decodes(&cleaned));
    }

    #[test]
    fn clean_fails_without_list_boundary() {
        let err = clean("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ParseError::MissingListBoundary { .. }));
    }

    #[test]
    fn clean_fails_on_empty() {
        assert!(matches!(clean("   ").unwrap_err(), ParseError::EmptyResponse));
        assert!(matches!(
            clean("```json\n```").unwrap_err(),
            ParseError::EmptyResponse
        ));
    }

    #[test]
    fn clean_is_idempotent() {
        let inputs = [
            VALID.to_string(),
            format!("```json\n{}\n```", VALID),
            "Prefix [1, 2,] suffix".to_string(),
            "[{\"a\": 1} // note\n,]".to_string(),
            r#"[{"q": "x", "note"}, {"q": "y" (sure)}] bye"#.to_string(),
            r#"[{"question": "broken"#.to_string() + "]",
            "[[1], [2]] and [3]".to_string(),
            "[1,,, 2,,,]".to_string(),
            r#"["<think>", "```"]"#.to_string(),
        ];
        for input in &inputs {
            let once = clean(input).unwrap();
            assert_eq!(clean(&once).unwrap(), once, "input: {input}");
        }
    }

    #[test]
    fn clean_collapses_comma_run_in_one_call() {
        let once = clean(r#"["bad \q escape", 1,,,,,,,,]"#).unwrap();
        assert_eq!(once, r#"["bad \q escape", 1]"#);
        assert_eq!(clean(&once).unwrap(), once);

        let long_run = format!("[1{}]", ",".repeat(40));
        assert_eq!(clean(&long_run).unwrap(), "[1]");
    }

    #[test]
    fn clean_keeps_tags_and_backticks_inside_strings() {
        let tag_text = r#"["<thi<thinking></thinking>nk>"]"#;
        assert_eq!(clean(tag_text).unwrap(), tag_text);

        let question = r#"[{"question": "Which tag wraps reasoning, <think> or <answer>?", "options": ["a", "b", "c", "d"], "correctAnswer": "a"}]"#;
        assert_eq!(clean(question).unwrap(), question);

        let fenced = "```json\n[{\"question\": \"What does ``` start?\"}]\n```";
        let cleaned = clean(fenced).unwrap();
        let v: serde_json::Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(v[0]["question"], "What does ``` start?");
        assert_eq!(clean(&cleaned).unwrap(), cleaned);
    }

    #[test]
    fn clean_lines_strips_fence_only() {
        let raw = "```\nQ? | a, b, c, d | a | because\n```";
        assert_eq!(clean_lines(raw).unwrap(), "Q? | a, b, c, d | a | because");
        assert_eq!(clean_lines(&clean_lines(raw).unwrap()).unwrap(), clean_lines(raw).unwrap());
    }

    #[test]
    fn clean_lines_empty_fails() {
        assert!(matches!(clean_lines("").unwrap_err(), ParseError::EmptyResponse));
    }
}
