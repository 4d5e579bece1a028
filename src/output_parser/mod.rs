//! # Model Output Parser
//!
//! Turns untrusted model text into raw candidate records. Handles think
//! blocks, markdown fences, surrounding prose, comments, trailing commas and
//! stray fragments without another model call.
//!
//! ## Stages
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`clean`] | Isolate the JSON list inside raw text |
//! | [`clean_lines`] | Strip fences for line-oriented text |
//! | [`parse_question_list`] | Decode a cleaned JSON list |
//! | [`parse_delimited_lines`] | Parse `q \| a, b, c, d \| answer \| why` lines |
//! | [`parse_candidates`] | Cleaner + parser for a [`WireShape`] |

pub mod clean;
pub mod delimited;
pub mod error;
pub mod extract;
pub mod json;
pub mod repair;

pub use clean::{clean, clean_lines};
pub use delimited::parse_delimited_lines;
pub use error::ParseError;
pub use extract::strip_think_tags;
pub use json::parse_question_list;
pub use repair::{remove_trailing_commas, strip_comments, strip_stray_fragments};

use serde_json::Value;

use crate::wire_shape::WireShape;

/// Run the cleaner and the parser for `shape` over raw model text.
///
/// With [`WireShape::Auto`], a text without any list boundary falls back to
/// delimited lines; a text with a boundary that fails to decode is still an
/// error.
///
/// # Examples
///
/// ```
/// use trivia_forge::output_parser::parse_candidates;
/// use trivia_forge::wire_shape::WireShape;
///
/// let lines = "Q? | a, b, c, d | a | because";
/// assert_eq!(parse_candidates(lines, WireShape::Auto).unwrap().len(), 1);
/// assert!(parse_candidates(lines, WireShape::StructuredList).is_err());
/// ```
pub fn parse_candidates(raw: &str, shape: WireShape) -> Result<Vec<Value>, ParseError> {
    match shape {
        WireShape::StructuredList => parse_question_list(&clean(raw)?),
        WireShape::DelimitedLines => Ok(parse_delimited_lines(&clean_lines(raw)?)),
        WireShape::Auto => match clean(raw) {
            Ok(cleaned) => parse_question_list(&cleaned),
            Err(ParseError::MissingListBoundary { .. }) => {
                Ok(parse_delimited_lines(&clean_lines(raw)?))
            }
            Err(e) => Err(e),
        },
    }
}
