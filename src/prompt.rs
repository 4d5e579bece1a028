//! Prompt construction for question generation.

use crate::escape::escape_json_str;
use crate::wire_shape::WireShape;

/// Sentinel that should never appear in real templates.
const ESCAPE_SENTINEL: &str = "\x00LBRACE\x00";
/// Sentinel for escaped closing brace.
const ESCAPE_SENTINEL_CLOSE: &str = "\x00RBRACE\x00";

const STRUCTURED_TEMPLATE: &str = r#"You are a fun and engaging trivia game host.
Generate {count} trivia questions for the category: "{category}".
Provide each question, 4 distinct multiple-choice options, and clearly indicate the correct answer.
The value for "correctAnswer" MUST EXACTLY MATCH one of the strings in the "options" array, without any leading or trailing whitespace.
Return a single JSON array of question objects, each with this structure:
[
    {{
      "question": "The actual trivia question text?",
      "options": ["Option A Text", "Option B Text", "Option C Text", "Option D Text"],
      "correctAnswer": "The text of the correct option"{explanation_field}
    }}
]
Ensure the options are distinct and plausible. The questions should be engaging and fit the category.
For "Brain Teasers", make it a riddle or short puzzle.
Ensure the entire response is ONLY the JSON array, without any surrounding text or markdown."#;

const DELIMITED_TEMPLATE: &str = r#"You are a fun and engaging trivia game host.
Generate {count} trivia questions for the category: "{category}".
Write exactly one question per line, in this format, with no other text:
question text | option A, option B, option C, option D | correct option | {explanation_hint}
The correct option MUST EXACTLY MATCH one of the four options. Options must be distinct and must not contain commas or pipes.
For "Brain Teasers", make it a riddle or short puzzle."#;

/// Build a prompt string with variable substitution.
///
/// Replaces `{key}` placeholders in the template with the matching value in
/// `vars`. Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use trivia_forge::prompt::render;
///
/// let result = render("Hello {name}, here is JSON: {{\"key\": \"val\"}}", &[("name", "Alice")]);
/// assert_eq!(result, r#"Hello Alice, here is JSON: {"key": "val"}"#);
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    // Pass 1: protect escaped braces
    let mut rendered = template.replace("{{", ESCAPE_SENTINEL);
    rendered = rendered.replace("}}", ESCAPE_SENTINEL_CLOSE);

    // Pass 2: substitute placeholders
    for (key, value) in vars {
        let placeholder = format!("{{{}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }

    // Pass 3: restore escaped braces
    rendered = rendered.replace(ESCAPE_SENTINEL, "{");
    rendered = rendered.replace(ESCAPE_SENTINEL_CLOSE, "}");
    rendered
}

/// Build the generation prompt for `count` questions in `category`.
///
/// The category text is kept as given, except that quotes, backslashes and
/// control characters are escaped because it sits inside a quoted string.
/// The output format section follows `shape`.
pub fn question_prompt(
    category: &str,
    count: usize,
    shape: WireShape,
    require_explanation: bool,
) -> String {
    let category = escape_json_str(category);
    let count = count.to_string();

    if shape.prompts_for_lines() {
        let hint = if require_explanation {
            "one-sentence explanation"
        } else {
            "optional one-sentence explanation"
        };
        return render(
            DELIMITED_TEMPLATE,
            &[
                ("count", &count),
                ("category", &category),
                ("explanation_hint", hint),
            ],
        );
    }

    let explanation_field = if require_explanation {
        ",\n      \"explanation\": \"One sentence on why the answer is correct\""
    } else {
        ""
    };
    render(
        STRUCTURED_TEMPLATE,
        &[
            ("count", &count),
            ("category", &category),
            ("explanation_field", explanation_field),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let result = render("Hello {name}, process {input}", &[("name", "Alice"), ("input", "data")]);
        assert_eq!(result, "Hello Alice, process data");
    }

    #[test]
    fn test_render_no_placeholders() {
        assert_eq!(render("static prompt", &[]), "static prompt");
    }

    #[test]
    fn test_render_escaped_braces_no_substitution() {
        let result = render("Output format: {{\"result\": {{\"value\": 42}}}}", &[]);
        assert_eq!(result, r#"Output format: {"result": {"value": 42}}"#);
    }

    #[test]
    fn test_render_value_braces_left_alone() {
        let result = render("Category: {category}", &[("category", "{{weird}}")]);
        assert_eq!(result, "Category: {{weird}}");
    }

    #[test]
    fn test_structured_prompt_contents() {
        let prompt = question_prompt("History", 20, WireShape::StructuredList, false);
        assert!(prompt.contains("Generate 20 trivia questions"));
        assert!(prompt.contains(r#"category: "History""#));
        assert!(prompt.contains(r#""correctAnswer": "The text of the correct option""#));
        assert!(!prompt.contains("explanation"));
        assert!(!prompt.contains("{count}"));
        assert!(prompt.contains("    {\n"));
    }

    #[test]
    fn test_structured_prompt_with_explanation() {
        let prompt = question_prompt("History", 5, WireShape::Auto, true);
        assert!(prompt.contains(r#""explanation": "#));
    }

    #[test]
    fn test_delimited_prompt() {
        let prompt = question_prompt("Science", 4, WireShape::DelimitedLines, false);
        assert!(prompt.contains("question text | option A, option B, option C, option D"));
        assert!(prompt.contains("optional one-sentence explanation"));
        assert!(!prompt.contains('['));
    }

    #[test]
    fn test_category_is_escaped() {
        let prompt = question_prompt("Movies \"80s\"\nedition", 3, WireShape::StructuredList, false);
        assert!(prompt.contains(r#"category: "Movies \"80s\"\nedition""#));
    }
}
