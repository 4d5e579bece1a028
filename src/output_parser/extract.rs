//! Shared extraction helpers for model output.
//!
//! Everything here is a pure `&str` transform. The cleaner composes these
//! before any decoding is attempted.

const FENCE: &str = "```";

/// Strip all `<think>...</think>` and `<thinking>...</thinking>` blocks from text.
///
/// Handles complete blocks, incomplete blocks (no closing tag),
/// and multiple sequential blocks. Tags inside JSON string literals are
/// content, not reasoning, and are left alone. Stripping repeats until no
/// opener remains, so the result is stable.
///
/// # Examples
///
/// ```
/// use trivia_forge::output_parser::strip_think_tags;
///
/// assert_eq!(strip_think_tags("<think>reasoning</think>result"), "result");
/// assert_eq!(strip_think_tags("<think>no closing tag"), "");
/// assert_eq!(strip_think_tags(r#"["<think>"]"#), r#"["<think>"]"#);
/// ```
pub fn strip_think_tags(text: &str) -> String {
    let mut result = text.to_string();
    loop {
        let stripped = strip_tag_variant(&result, "<think>", "</think>");
        let stripped = strip_tag_variant(&stripped, "<thinking>", "</thinking>");
        if stripped == result {
            return result;
        }
        result = stripped;
    }
}

fn strip_tag_variant(text: &str, open: &str, close: &str) -> String {
    let mut result = text.to_string();
    while let Some(start) = find_outside_strings(&result, open) {
        let body_start = start + open.len();
        if let Some(end_offset) = result[body_start..].find(close) {
            let end = body_start + end_offset + close.len();
            result.replace_range(start..end, "");
        } else {
            // No closing tag: the rest is unfinished reasoning
            result.truncate(start);
            break;
        }
    }
    result
}

/// Return the inner content of the first triple-backtick fence.
///
/// An optional language tag (`` ```json ``) directly after the opener is
/// skipped. An unterminated fence keeps everything after the opener. Text
/// without a fence is returned trimmed. Backticks inside JSON string
/// literals never open or close a fence.
///
/// # Examples
///
/// ```
/// use trivia_forge::output_parser::extract::strip_code_fence;
///
/// assert_eq!(strip_code_fence("Here:\n```json\n[1, 2]\n```\nBye"), "[1, 2]");
/// assert_eq!(strip_code_fence("[1, 2]"), "[1, 2]");
/// ```
pub fn strip_code_fence(text: &str) -> &str {
    let Some(open) = find_outside_strings(text, FENCE) else {
        return text.trim();
    };
    let after = &text[open + FENCE.len()..];

    let tag_len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(after.len());
    // Only a tag if something structural or a line break follows it
    let tag_len = match after[tag_len..].chars().next() {
        None => tag_len,
        Some(c) if c.is_whitespace() || c == '[' || c == '{' => tag_len,
        Some(_) => 0,
    };

    let body = &after[tag_len..];
    let inner = match find_outside_strings(body, FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    inner.trim()
}

/// Byte offset of the first `needle` that is not inside a JSON string literal.
///
/// `needle` must not start with `"` or a backslash.
fn find_outside_strings(text: &str, needle: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = needle.as_bytes();
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if b == b'\\' {
                escape_next = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if bytes[i..].starts_with(needle) {
            return Some(i);
        }
    }
    None
}

/// Locate the outermost list region: first `[` through last `]`.
///
/// Returns `None` if either boundary is missing or they are out of order.
///
/// # Examples
///
/// ```
/// use trivia_forge::output_parser::extract::find_list_bounds;
///
/// assert_eq!(find_list_bounds("Sure! [1, [2]] Enjoy."), Some("[1, [2]]"));
/// assert_eq!(find_list_bounds("no list"), None);
/// ```
pub fn find_list_bounds(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
