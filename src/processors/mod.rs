//! Processors of the entity reconstruction pipeline.
//!
//! - [`geometry`] - pixel and normalized boxes, coordinate normalization
//! - [`entity_merge`] - token tags to entities
//! - [`line_grouping`] - entities to visual lines
//! - [`field_format`] - lines to question/answer fields
//!
//! [`extract_fields`] chains the last three steps. Every step is a pure
//! function of its input.

pub mod entity_merge;
pub mod field_format;
pub mod geometry;
pub mod line_grouping;

pub use entity_merge::merge_entities;
pub use field_format::{format_field, format_fields};
pub use geometry::{NormalizedBox, PixelBox, normalize_box, normalize_boxes};
pub use line_grouping::{LineGrouper, group_lines};

use crate::domain::{ClassificationResult, Field, Line};

/// Rebuilds lines from a classification result.
pub fn reconstruct_lines(result: &ClassificationResult, grouper: &LineGrouper) -> Vec<Line> {
    grouper.group(merge_entities(&result.tokens))
}

/// Rebuilds the question/answer fields of a classification result.
pub fn extract_fields(result: &ClassificationResult, grouper: &LineGrouper) -> Vec<Field> {
    format_fields(&reconstruct_lines(result, grouper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClassifiedToken;

    fn row_token(text: &str, label: &str, x: u32, continuation: bool) -> ClassifiedToken {
        ClassifiedToken::new(text, label, NormalizedBox::new(x, 100, x + 40, 112), continuation)
    }

    #[test]
    fn test_extract_fields_is_deterministic() {
        let result = ClassificationResult::new(
            vec![
                ClassifiedToken::special("<s>", "O"),
                row_token("Name", "B-QUESTION", 10, false),
                row_token(":", "O", 55, false),
                row_token("John", "B-ANSWER", 300, false),
                row_token("Doe", "I-ANSWER", 350, false),
                ClassifiedToken::special("</s>", "O"),
            ],
            Default::default(),
        );
        let grouper = LineGrouper::default();

        let first = extract_fields(&result, &grouper);
        let second = extract_fields(&result, &grouper);
        assert_eq!(first, second);
        assert_eq!(first, vec![Field::new("Name", "John Doe")]);
    }
}
