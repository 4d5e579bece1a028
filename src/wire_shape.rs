//! Wire shape selection for model output.
//!
//! [`WireShape`] determines which parser turns the raw model text into
//! candidate records, and which output format the prompt asks for.

use std::fmt;
use std::str::FromStr;

/// The textual format the model is asked to produce and the parser expects.
///
/// # Example
///
/// ```
/// use trivia_forge::wire_shape::WireShape;
///
/// let shape: WireShape = "delimited".parse().unwrap();
/// assert_eq!(shape, WireShape::DelimitedLines);
/// assert_eq!(WireShape::default(), WireShape::StructuredList);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireShape {
    /// A JSON array of question objects.
    #[default]
    StructuredList,

    /// One question per line: `question | a, b, c, d | answer | explanation`.
    DelimitedLines,

    /// Structured when a `[` ... `]` region exists, delimited lines otherwise.
    /// The prompt asks for the structured shape.
    Auto,
}

impl WireShape {
    /// Whether the prompt should ask for pipe-delimited lines.
    pub fn prompts_for_lines(self) -> bool {
        matches!(self, WireShape::DelimitedLines)
    }
}

impl FromStr for WireShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "structured-list" | "json" => Ok(WireShape::StructuredList),
            "delimited" | "delimited-lines" | "lines" | "pipe" => Ok(WireShape::DelimitedLines),
            "auto" => Ok(WireShape::Auto),
            other => Err(format!(
                "unknown wire shape '{}' (expected structured, delimited or auto)",
                other
            )),
        }
    }
}

impl fmt::Display for WireShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WireShape::StructuredList => "structured",
            WireShape::DelimitedLines => "delimited",
            WireShape::Auto => "auto",
        })
    }
}
