//! Result of analyzing one form image.

use crate::domain::{Field, Line};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields and intermediate lines reconstructed from one image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormAnalysis {
    /// Question/answer pairs, top to bottom.
    pub fields: Vec<Field>,
    /// The visual lines the fields were built from.
    pub lines: Vec<Line>,
    /// Number of words found by OCR.
    pub word_count: usize,
    /// Number of non-special tokens classified.
    pub token_count: usize,
}

impl FormAnalysis {
    /// Returns true if no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for FormAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{}: {}", field.question, field.answer)?;
        }
        Ok(())
    }
}
