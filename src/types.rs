use serde::Serialize;

/// Category used when the caller does not name one.
pub const DEFAULT_CATEGORY: &str = "General Knowledge";

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// A validated multiple-choice trivia question.
///
/// Only the [`QuestionValidator`](crate::validator::QuestionValidator) builds
/// these, so every instance upholds the schema: non-empty trimmed text, four
/// distinct non-empty options, and a `correct_answer` equal to one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// The question prompt.
    #[serde(rename = "question")]
    pub(crate) text: String,

    /// Answer options in display order.
    pub(crate) options: [String; OPTION_COUNT],

    /// Exactly one of `options`.
    pub(crate) correct_answer: String,

    /// Short free-text explanation, when the model supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) explanation: Option<String>,
}

impl QuestionRecord {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Key used to recognise the same question across batches.
    pub fn dedup_key(&self) -> String {
        normalize_question_text(&self.text)
    }
}

/// Normalize question text for duplicate detection: trimmed, case-folded,
/// inner whitespace collapsed.
pub fn normalize_question_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolve the category supplied by a caller.
///
/// Blank input counts as absent and gets [`DEFAULT_CATEGORY`]; anything else
/// is returned as given.
pub fn resolve_category(category: Option<&str>) -> &str {
    match category {
        Some(c) if !c.trim().is_empty() => c,
        _ => DEFAULT_CATEGORY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> QuestionRecord {
        QuestionRecord {
            text: "Capital of France?".into(),
            options: ["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
            correct_answer: "Paris".into(),
            explanation: None,
        }
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["question"], "Capital of France?");
        assert_eq!(value["correctAnswer"], "Paris");
        assert_eq!(value["options"].as_array().unwrap().len(), 4);
        assert!(value.get("explanation").is_none());
    }

    #[test]
    fn test_explanation_serialized_when_present() {
        let mut r = record();
        r.explanation = Some("It is.".into());
        let value = serde_json::to_value(r).unwrap();
        assert_eq!(value["explanation"], "It is.");
    }

    #[test]
    fn test_dedup_key_normalizes() {
        assert_eq!(normalize_question_text("  Capital   of FRANCE? "), "capital of france?");
        assert_eq!(record().dedup_key(), "capital of france?");
    }

    #[test]
    fn test_resolve_category() {
        assert_eq!(resolve_category(None), DEFAULT_CATEGORY);
        assert_eq!(resolve_category(Some("  ")), DEFAULT_CATEGORY);
        assert_eq!(resolve_category(Some("Brain Teasers")), "Brain Teasers");
    }
}
