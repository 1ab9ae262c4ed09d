//! Form reconstruction types: words, entities, lines and fields.

use crate::processors::PixelBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A word detected by OCR, with its box in source-pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// The literal text of the word.
    pub text: String,
    /// The word box in pixels.
    pub bbox: PixelBox,
}

impl Word {
    /// Creates a new word.
    pub fn new(text: impl Into<String>, bbox: PixelBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// The entity type of a BIO tag, without its `B-`/`I-` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityLabel {
    /// A form question (field caption).
    Question,
    /// A form answer (field value).
    Answer,
    /// Any other entity type the model knows, such as `HEADER`.
    Other(String),
}

impl EntityLabel {
    /// Parses a BIO tag, keeping only the part after the last `-`.
    ///
    /// `"B-QUESTION"` and `"I-QUESTION"` both give [`EntityLabel::Question`];
    /// a tag without a prefix is used as is.
    pub fn from_tag(tag: &str) -> Self {
        let suffix = tag.rsplit('-').next().unwrap_or(tag);
        match suffix {
            "QUESTION" => EntityLabel::Question,
            "ANSWER" => EntityLabel::Answer,
            other => EntityLabel::Other(other.to_string()),
        }
    }

    /// Returns the label name as used in the model's tag set.
    pub fn as_str(&self) -> &str {
        match self {
            EntityLabel::Question => "QUESTION",
            EntityLabel::Answer => "ANSWER",
            EntityLabel::Other(name) => name,
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run of consecutive same-label tokens merged into one text span.
///
/// `x` and `y` are the top-left corner of the first token of the run, on the
/// normalized grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Concatenated token text.
    pub text: String,
    /// Entity type.
    pub label: EntityLabel,
    /// Left edge of the first token.
    pub x: i64,
    /// Top edge of the first token.
    pub y: i64,
}

impl Entity {
    /// Creates a new entity.
    pub fn new(text: impl Into<String>, label: EntityLabel, x: i64, y: i64) -> Self {
        Self {
            text: text.into(),
            label,
            x,
            y,
        }
    }
}

/// Entities sharing one visual row, ordered left to right.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Line {
    /// The entities of the row.
    pub entities: Vec<Entity>,
}

impl Line {
    /// Creates a line from already ordered entities.
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// Returns the entities of the line.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns the number of entities in the line.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the line has no entity.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Space-joined text of the entities carrying `label`, in line order.
    pub fn text_for(&self, label: &EntityLabel) -> String {
        self.entities
            .iter()
            .filter(|e| &e.label == label)
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A question/answer pair extracted from one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Question text, or a placeholder when the line only has an answer.
    pub question: String,
    /// Answer text, possibly empty.
    pub answer: String,
}

impl Field {
    /// Creates a new field.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_label_from_tag() {
        assert_eq!(EntityLabel::from_tag("B-QUESTION"), EntityLabel::Question);
        assert_eq!(EntityLabel::from_tag("I-QUESTION"), EntityLabel::Question);
        assert_eq!(EntityLabel::from_tag("B-ANSWER"), EntityLabel::Answer);
        assert_eq!(EntityLabel::from_tag("ANSWER"), EntityLabel::Answer);
        assert_eq!(
            EntityLabel::from_tag("B-HEADER"),
            EntityLabel::Other("HEADER".to_string())
        );
        // Only the part after the last dash is kept.
        assert_eq!(
            EntityLabel::from_tag("S-B-ANSWER"),
            EntityLabel::Answer
        );
    }

    #[test]
    fn test_entity_label_display() {
        assert_eq!(EntityLabel::Question.to_string(), "QUESTION");
        assert_eq!(EntityLabel::Other("HEADER".into()).to_string(), "HEADER");
    }

    #[test]
    fn test_line_text_for() {
        let line = Line::new(vec![
            Entity::new("Date", EntityLabel::Question, 0, 10),
            Entity::new("of", EntityLabel::Question, 40, 10),
            Entity::new("12/03/1990", EntityLabel::Answer, 200, 11),
            Entity::new("Page", EntityLabel::Other("HEADER".into()), 500, 9),
        ]);
        assert_eq!(line.text_for(&EntityLabel::Question), "Date of");
        assert_eq!(line.text_for(&EntityLabel::Answer), "12/03/1990");
        assert_eq!(line.len(), 4);
    }

    #[test]
    fn test_field_serializes_as_question_answer_object() {
        let json = serde_json::to_string(&Field::new("Name", "John")).unwrap();
        assert_eq!(json, r#"{"question":"Name","answer":"John"}"#);
    }
}
