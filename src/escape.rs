//! JSON-safe escaping for text embedded inside a JSON string literal.

/// Trim `s` and escape it for placement between JSON double quotes.
///
/// Escapes backslash, double quote, newline, carriage return and tab. Other
/// control characters are emitted as `\u00XX`. Decoding `"` + output + `"`
/// as JSON yields `s.trim()`.
///
/// # Examples
///
/// ```
/// use trivia_forge::escape::escape_json_str;
///
/// assert_eq!(escape_json_str(" say \"hi\"\n"), r#"say \"hi\""#);
/// assert_eq!(escape_json_str("a\tb\\c"), r"a\tb\\c");
/// ```
pub fn escape_json_str(s: &str) -> String {
    let trimmed = s.trim();
    let mut out = String::with_capacity(trimmed.len() + 8);
    for c in trimmed.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
