//! Schema validation and canonicalization of candidate questions.
//!
//! [`QuestionValidator`] checks each raw candidate produced by the
//! [`output_parser`](crate::output_parser) and builds [`QuestionRecord`]s
//! from the ones that pass. Minor drift (whitespace, answer given as a
//! fragment of an option) is repaired; anything ambiguous is dropped.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::output_parser::json::json_type_name;
use crate::types::{QuestionRecord, OPTION_COUNT};

/// How a model's `correctAnswer` is matched against the options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerMatch {
    /// Trimmed answer must equal a trimmed option exactly.
    Exact,

    /// Trimmed, case-folded answer must be a substring of a trimmed,
    /// case-folded option. The answer is rewritten to that option's text.
    ///
    /// This is not plain first-match. Options are tried in three rounds:
    /// 1. an option equal to the answer;
    /// 2. an option equal to the answer ignoring case;
    /// 3. the first option, in order, that contains the answer.
    ///
    /// So with options `["Paris, France", "Paris"]` and answer `"paris"`,
    /// `"Paris"` is chosen even though the first option also contains it.
    #[default]
    Containment,
}

/// What happens to a batch in which some candidates fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Any invalid candidate discards the entire batch.
    Strict,

    /// Keep whatever validated, even if that is nothing.
    #[default]
    Lenient,
}

/// Validator settings. Both policies are explicit; nothing is mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidatorConfig {
    pub answer_match: AnswerMatch,
    pub policy: BatchPolicy,
    /// Reject candidates without a non-empty `explanation` string.
    pub require_explanation: bool,
}

impl ValidatorConfig {
    pub fn with_answer_match(mut self, answer_match: AnswerMatch) -> Self {
        self.answer_match = answer_match;
        self
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_require_explanation(mut self, required: bool) -> Self {
        self.require_explanation = required;
        self
    }
}

/// Why a single candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("candidate is a {0}, not an object")]
    NotAnObject(&'static str),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' should be a {expected}, got {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("expected {OPTION_COUNT} options, got {0}")]
    OptionCount(usize),

    #[error("duplicate option '{0}'")]
    DuplicateOption(String),

    #[error("correct answer '{answer}' not found in options {options:?}")]
    AnswerNotInOptions {
        answer: String,
        options: Vec<String>,
    },
}

/// Strict-policy failure: at least one candidate in the batch was invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("batch rejected: {} of {total} candidates invalid", failures.len())]
pub struct BatchRejected {
    /// Number of candidates in the batch.
    pub total: usize,
    /// `(index, reason)` for every invalid candidate.
    pub failures: Vec<(usize, ValidationError)>,
}

/// Validates candidate mappings into [`QuestionRecord`]s.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use trivia_forge::validator::{QuestionValidator, ValidatorConfig};
///
/// let validator = QuestionValidator::new(ValidatorConfig::default());
/// let candidates = vec![json!({
///     "question": "Capital of France?",
///     "options": ["  Paris, France  ", "London", "Berlin", "Madrid"],
///     "correctAnswer": "Paris",
/// })];
/// let records = validator.validate("Geography", &candidates).unwrap();
/// assert_eq!(records[0].correct_answer(), "Paris, France");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuestionValidator {
    config: ValidatorConfig,
}

impl QuestionValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a batch of candidates, in order.
    ///
    /// Every dropped candidate is logged with its category and reason. Under
    /// [`BatchPolicy::Strict`] a single failure returns [`BatchRejected`];
    /// under [`BatchPolicy::Lenient`] the valid subset is returned.
    pub fn validate(
        &self,
        category: &str,
        candidates: &[Value],
    ) -> Result<Vec<QuestionRecord>, BatchRejected> {
        let mut accepted = Vec::with_capacity(candidates.len());
        let mut failures = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            match self.validate_one(candidate) {
                Ok(record) => accepted.push(record),
                Err(reason) => {
                    tracing::warn!(category, index, reason = %reason, "dropping invalid question");
                    failures.push((index, reason));
                }
            }
        }

        if self.config.policy == BatchPolicy::Strict && !failures.is_empty() {
            return Err(BatchRejected {
                total: candidates.len(),
                failures,
            });
        }
        Ok(accepted)
    }

    /// Validate and canonicalize a single candidate.
    pub fn validate_one(&self, candidate: &Value) -> Result<QuestionRecord, ValidationError> {
        let fields = candidate
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(json_type_name(candidate)))?;

        let text = required_str(fields, "question", &["question"])?;
        let options = options(fields)?;
        let answer = required_str(fields, "correctAnswer", &["correctAnswer", "correct_answer"])?;

        let explanation = match fields.get("explanation") {
            None | Some(Value::Null) if self.config.require_explanation => {
                return Err(ValidationError::MissingField("explanation"));
            }
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => {
                if self.config.require_explanation {
                    return Err(ValidationError::EmptyField("explanation"));
                }
                None
            }
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(other) => {
                return Err(ValidationError::WrongType {
                    field: "explanation",
                    expected: "string",
                    found: json_type_name(other),
                })
            }
        };

        let correct_answer = self
            .match_answer(answer, &options)
            .ok_or_else(|| ValidationError::AnswerNotInOptions {
                answer: answer.to_string(),
                options: options.to_vec(),
            })?;

        Ok(QuestionRecord {
            text: text.to_string(),
            options,
            correct_answer,
            explanation,
        })
    }

    /// Find the option `answer` refers to, per the configured [`AnswerMatch`].
    fn match_answer(&self, answer: &str, options: &[String; OPTION_COUNT]) -> Option<String> {
        if let Some(exact) = options.iter().find(|o| o.as_str() == answer) {
            return Some(exact.clone());
        }
        if self.config.answer_match == AnswerMatch::Exact {
            return None;
        }

        let needle = answer.to_lowercase();
        let folded: Vec<String> = options.iter().map(|o| o.to_lowercase()).collect();
        folded
            .iter()
            .position(|o| *o == needle)
            .or_else(|| folded.iter().position(|o| o.contains(&needle)))
            .map(|i| options[i].clone())
    }
}

/// Read a non-empty string field (trimmed), trying each alias in order.
fn required_str<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
    aliases: &[&str],
) -> Result<&'a str, ValidationError> {
    let value = aliases
        .iter()
        .find_map(|key| fields.get(*key))
        .ok_or(ValidationError::MissingField(name))?;
    let s = value.as_str().ok_or_else(|| ValidationError::WrongType {
        field: name,
        expected: "string",
        found: json_type_name(value),
    })?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    Ok(trimmed)
}

fn options(fields: &Map<String, Value>) -> Result<[String; OPTION_COUNT], ValidationError> {
    let value = fields
        .get("options")
        .ok_or(ValidationError::MissingField("options"))?;
    let items = value.as_array().ok_or_else(|| ValidationError::WrongType {
        field: "options",
        expected: "array",
        found: json_type_name(value),
    })?;
    if items.len() != OPTION_COUNT {
        return Err(ValidationError::OptionCount(items.len()));
    }

    let mut seen = HashSet::with_capacity(OPTION_COUNT);
    let mut out: [String; OPTION_COUNT] = Default::default();
    for (slot, item) in out.iter_mut().zip(items) {
        let option = item
            .as_str()
            .ok_or_else(|| ValidationError::WrongType {
                field: "options",
                expected: "string",
                found: json_type_name(item),
            })?
            .trim();
        if option.is_empty() {
            return Err(ValidationError::EmptyField("options"));
        }
        if !seen.insert(option) {
            return Err(ValidationError::DuplicateOption(option.to_string()));
        }
        *slot = option.to_string();
    }
    Ok(out)
}

impl FromStr for AnswerMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(AnswerMatch::Exact),
            "containment" | "contains" | "loose" => Ok(AnswerMatch::Containment),
            other => Err(format!(
                "unknown answer match '{}' (expected exact or containment)",
                other
            )),
        }
    }
}

impl fmt::Display for AnswerMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnswerMatch::Exact => "exact",
            AnswerMatch::Containment => "containment",
        })
    }
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(BatchPolicy::Strict),
            "lenient" => Ok(BatchPolicy::Lenient),
            other => Err(format!(
                "unknown batch policy '{}' (expected strict or lenient)",
                other
            )),
        }
    }
}

impl fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchPolicy::Strict => "strict",
            BatchPolicy::Lenient => "lenient",
        })
    }
}
