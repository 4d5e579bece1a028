//! Deterministic repairs for common model JSON mistakes.
//!
//! All repairs are manual character scans that track string state, so text
//! inside quoted values is never touched. No regex is used.

/// Strip `// ...` and `/* ... */` comments, avoiding strings.
///
/// Models echo placeholder lines like `// ... more questions` from the prompt.
pub fn strip_comments(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let mut result = String::with_capacity(s.len());
    let mut i = 0;
    let mut in_string = false;
    let mut escape_next = false;

    while i < len {
        let c = chars[i];
        if in_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            result.push(c);
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == '/' && i + 1 < len && chars[i + 1] == '/' {
            while i < len && chars[i] != '\n' {
                i += 1;
            }
            continue;
        } else if c == '/' && i + 1 < len && chars[i + 1] == '*' {
            i += 2;
            while i + 1 < len && !(chars[i] == '*' && chars[i + 1] == '/') {
                i += 1;
            }
            i = (i + 2).min(len);
            continue;
        }

        result.push(c);
        i += 1;
    }
    result
}

/// Remove trailing commas before `}` or `]`.
pub fn remove_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let mut result = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape_next = false;

    for i in 0..len {
        let c = chars[i];
        if in_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            result.push(c);
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            // A whole run of commas before a closer goes at once
            let next = chars[i + 1..]
                .iter()
                .find(|ch| !ch.is_whitespace() && **ch != ',');
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Key,
    Colon,
    Value,
    Separator,
}

#[derive(Debug)]
struct Frame {
    object: bool,
    expect: Expect,
    /// Output length right after the opener.
    open_end: usize,
    /// Output length before the member currently being read (before its comma).
    member_start: usize,
}

impl Frame {
    fn first_expect(&self) -> Expect {
        if self.object {
            Expect::Key
        } else {
            Expect::Value
        }
    }
}

/// Drop stray prose and dangling fragments that break strict decoding.
///
/// Walks the payload as a stream of JSON tokens and keeps only what is legal
/// at each position:
/// - prose after a value, or between members, is dropped;
/// - a key left without a value before a closing brace is removed together
///   with its comma (`..., "note"}` becomes `...}`);
/// - a missing comma before the next key or array element is inserted;
/// - anything after the outermost container closes is dropped.
///
/// Best effort: the result is not guaranteed to decode. The output of this
/// function is a fixpoint (running it again changes nothing).
pub fn strip_stray_fragments(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(s.len());
    let mut stack: Vec<Frame> = Vec::new();
    let mut started = false;
    let mut i = 0;

    while i < len {
        let c = chars[i];

        if c.is_whitespace() {
            if !stack.is_empty() {
                out.push(c);
            }
            i += 1;
            continue;
        }

        let Some(frame) = stack.last_mut() else {
            if started {
                // Outermost container closed; the rest is trailing prose
                break;
            }
            if c == '[' || c == '{' {
                out.push(c);
                stack.push(Frame {
                    object: c == '{',
                    expect: if c == '{' { Expect::Key } else { Expect::Value },
                    open_end: out.len(),
                    member_start: out.len(),
                });
                started = true;
            }
            i += 1;
            continue;
        };

        match c {
            '"' => {
                let end = string_end(&chars, i);
                let next = next_significant(&chars, end);
                match frame.expect {
                    Expect::Key | Expect::Value => {
                        out.extend(&chars[i..end]);
                        frame.expect = if frame.expect == Expect::Key {
                            Expect::Colon
                        } else {
                            Expect::Separator
                        };
                    }
                    Expect::Separator if frame.object && next == Some(':') => {
                        // Missing comma before the next key
                        frame.member_start = out.len();
                        out.push(',');
                        out.extend(&chars[i..end]);
                        frame.expect = Expect::Colon;
                    }
                    Expect::Separator if !frame.object => {
                        frame.member_start = out.len();
                        out.push(',');
                        out.extend(&chars[i..end]);
                    }
                    // Stray quoted prose
                    _ => {}
                }
                i = end;
                continue;
            }
            ':' => {
                if frame.expect == Expect::Colon {
                    out.push(':');
                    frame.expect = Expect::Value;
                }
            }
            ',' => match frame.expect {
                Expect::Separator => {
                    frame.member_start = out.len();
                    out.push(',');
                    frame.expect = frame.first_expect();
                }
                Expect::Colon | Expect::Value if frame.object => {
                    // Key without value: drop it, then treat the comma normally
                    out.truncate(frame.member_start);
                    if out.len() == frame.open_end {
                        frame.expect = Expect::Key;
                    } else {
                        frame.member_start = out.len();
                        out.push(',');
                        frame.expect = Expect::Key;
                    }
                }
                _ => {}
            },
            '[' | '{' => {
                let legal = match frame.expect {
                    Expect::Value => true,
                    Expect::Separator if !frame.object => {
                        frame.member_start = out.len();
                        out.push(',');
                        true
                    }
                    _ => false,
                };
                if legal {
                    frame.expect = Expect::Separator;
                    out.push(c);
                    stack.push(Frame {
                        object: c == '{',
                        expect: if c == '{' { Expect::Key } else { Expect::Value },
                        open_end: out.len(),
                        member_start: out.len(),
                    });
                } else {
                    // Unreachable container: skip it whole
                    i = container_end(&chars, i);
                    continue;
                }
            }
            '}' | ']' => {
                if frame.object != (c == '}') {
                    // Mismatched closer is stray
                    i += 1;
                    continue;
                }
                if frame.expect != Expect::Separator {
                    out.truncate(frame.member_start);
                }
                out.push(c);
                stack.pop();
            }
            _ => {
                if frame.expect == Expect::Value {
                    let end = literal_end(&chars, i).max(i + 1);
                    let token: String = chars[i..end].iter().collect();
                    if is_json_literal(&token) {
                        out.push_str(&token);
                        frame.expect = Expect::Separator;
                    }
                    i = end;
                    continue;
                }
                // Bare prose character in any other position
            }
        }
        i += 1;
    }
    out
}

/// Index just past the closing quote of the string starting at `start`.
fn string_end(chars: &[char], start: usize) -> usize {
    let mut escape_next = false;
    for (offset, &c) in chars[start + 1..].iter().enumerate() {
        if escape_next {
            escape_next = false;
        } else if c == '\\' {
            escape_next = true;
        } else if c == '"' {
            return start + 1 + offset + 1;
        }
    }
    chars.len()
}

/// Index just past the container opened at `start` (string-aware).
fn container_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '"' => {
                i = string_end(chars, i);
                continue;
            }
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

fn literal_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|c| !(c.is_alphanumeric() || matches!(c, '.' | '+' | '-')))
        .map_or(chars.len(), |p| start + p)
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

fn is_json_literal(token: &str) -> bool {
    matches!(token, "true" | "false" | "null")
        || serde_json::from_str::<serde_json::Number>(token).is_ok()
}
