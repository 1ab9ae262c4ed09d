//! Traits at the external seams of the pipeline.
//!
//! The OCR engine and the token classifier are third-party components. The
//! pipeline only depends on these two traits, so tests and alternative
//! backends can plug in their own implementations.

use crate::core::errors::DigitizerError;
use crate::domain::{ClassificationResult, Word};
use crate::processors::NormalizedBox;
use image::RgbImage;

/// Detects words and their pixel boxes in an image.
pub trait WordDetector: Send + Sync {
    /// Returns every non-blank word found in `image`, in reading order as
    /// reported by the engine.
    fn detect_words(&self, image: &RgbImage) -> Result<Vec<Word>, DigitizerError>;

    /// Short name of the engine, used in logs.
    fn name(&self) -> &str;
}

/// Classifies the tokens of a document into BIO-tagged entity labels.
pub trait TokenClassifier: Send + Sync {
    /// Classifies `words`, laid out at `boxes` (parallel to `words`) on `image`.
    ///
    /// Returns one classified token per model token, in model order.
    fn classify(
        &self,
        image: &RgbImage,
        words: &[String],
        boxes: &[NormalizedBox],
    ) -> Result<ClassificationResult, DigitizerError>;

    /// Short name of the model, used in logs.
    fn name(&self) -> &str;
}
