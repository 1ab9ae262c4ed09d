//! Field formatting.
//!
//! Turns each line into a question/answer pair for display.

use crate::core::constants::DETECTED_FIELD_PLACEHOLDER;
use crate::domain::{EntityLabel, Field, Line};

/// Builds the field of one line.
///
/// Question and answer are the space-joined texts of the line's `QUESTION`
/// and `ANSWER` entities, trimmed. Returns `None` when both are empty. A line
/// with an answer but no question gets [`DETECTED_FIELD_PLACEHOLDER`] as its
/// question.
pub fn format_field(line: &Line) -> Option<Field> {
    let question = line.text_for(&EntityLabel::Question);
    let answer = line.text_for(&EntityLabel::Answer);
    let question = question.trim();
    let answer = answer.trim();

    if question.is_empty() && answer.is_empty() {
        return None;
    }

    let question = if question.is_empty() {
        DETECTED_FIELD_PLACEHOLDER
    } else {
        question
    };

    Some(Field::new(question, answer))
}

/// Builds the fields of all lines, dropping lines without question or answer.
pub fn format_fields(lines: &[Line]) -> Vec<Field> {
    lines.iter().filter_map(format_field).collect()
}
