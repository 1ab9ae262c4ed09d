//! Token classification output types.

use crate::core::constants::OUTSIDE_LABEL;
use crate::processors::NormalizedBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One model token with its predicted BIO tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedToken {
    /// Decoded token text, trimmed.
    pub text: String,
    /// True when the token continues the previous token's word rather than
    /// starting a new word.
    pub is_continuation: bool,
    /// Predicted BIO tag, e.g. `B-QUESTION`, `I-ANSWER` or `O`.
    pub label: String,
    /// Token box on the normalized grid.
    pub bbox: NormalizedBox,
    /// True for the model's start, end and padding markers.
    pub is_special: bool,
}

impl ClassifiedToken {
    /// Creates a regular (non-special) token.
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        bbox: NormalizedBox,
        is_continuation: bool,
    ) -> Self {
        Self {
            text: text.into(),
            is_continuation,
            label: label.into(),
            bbox,
            is_special: false,
        }
    }

    /// Creates a special marker token.
    pub fn special(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_continuation: false,
            label: label.into(),
            bbox: NormalizedBox::ZERO,
            is_special: true,
        }
    }

    /// Returns true if the token is outside every entity.
    pub fn is_outside(&self) -> bool {
        self.label == OUTSIDE_LABEL
    }
}

/// Per-token output of a [`TokenClassifier`](crate::core::traits::TokenClassifier).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Tokens in model order.
    pub tokens: Vec<ClassifiedToken>,
    /// The label table the tags were decoded with.
    pub id2label: BTreeMap<usize, String>,
}

impl ClassificationResult {
    /// Creates a new classification result.
    pub fn new(tokens: Vec<ClassifiedToken>, id2label: BTreeMap<usize, String>) -> Self {
        Self { tokens, id2label }
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if there is no token.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens that are neither special nor labelled `O`.
    pub fn entity_token_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| !t.is_special && !t.is_outside())
            .count()
    }
}
