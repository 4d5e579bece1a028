//! Pipe-delimited line parsing.
//!
//! Each usable line has the shape
//! `question | option A, option B, option C, option D | correct answer | explanation`.
//! Lines that do not fit are skipped one by one; they never fail the parse.

use serde_json::{json, Map, Value};

/// Primary field delimiter.
const FIELD_DELIMITER: char = '|';
/// Delimiter between the options inside the second field.
const OPTION_DELIMITER: char = ',';
const FIELD_COUNT: usize = 4;
const OPTION_COUNT: usize = 4;

/// Parse delimited lines into candidate records, in source order.
///
/// Produces mappings with the same keys as the structured shape
/// (`question`, `options`, `correctAnswer`, `explanation`), so the validator
/// treats both shapes identically. An empty explanation field is omitted.
///
/// # Examples
///
/// ```
/// use trivia_forge::output_parser::parse_delimited_lines;
///
/// let text = "Capital of Peru? | Lima, Quito, Cusco, Bogota | Lima | It is.\nnot a question";
/// let candidates = parse_delimited_lines(text);
/// assert_eq!(candidates.len(), 1);
/// assert_eq!(candidates[0]["correctAnswer"], "Lima");
/// ```
pub fn parse_delimited_lines(text: &str) -> Vec<Value> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = strip_list_marker(line.trim());
            if line.is_empty() {
                return None;
            }
            parse_line(line).or_else(|| {
                tracing::warn!(line = index + 1, content = %line, "skipping malformed question line");
                None
            })
        })
        .collect()
}

fn parse_line(line: &str) -> Option<Value> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return None;
    }

    let options: Vec<&str> = fields[1].split(OPTION_DELIMITER).map(str::trim).collect();
    if options.len() != OPTION_COUNT {
        return None;
    }

    let mut record = Map::new();
    record.insert("question".into(), json!(fields[0]));
    record.insert("options".into(), json!(options));
    record.insert("correctAnswer".into(), json!(fields[2]));
    if !fields[3].is_empty() {
        record.insert("explanation".into(), json!(fields[3]));
    }
    Some(Value::Object(record))
}

/// Drop a leading `1.`, `2)`, `-`, `*` or `•` list marker.
///
/// A marker only counts when whitespace follows it, so `3.14` or `-5` survive.
fn strip_list_marker(line: &str) -> &str {
    let digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let marker_rest = if digits.len() < line.len() {
        digits.strip_prefix('.').or_else(|| digits.strip_prefix(')'))
    } else {
        ["-", "*", "\u{2022}"]
            .iter()
            .find_map(|prefix| line.strip_prefix(prefix))
    };
    match marker_rest {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => line,
    }
}
