//! The [`FormDigitizer`] service and its builder.

use super::{DigitizerConfig, FormAnalysis};
use crate::core::errors::DigitizerError;
use crate::core::traits::{TokenClassifier, WordDetector};
use crate::domain::adapters::{LayoutLmv3ClassifierBuilder, TesseractOcr};
use crate::domain::{ClassificationResult, Field, Word};
use crate::processors::{LineGrouper, PixelBox, format_fields, normalize_boxes, reconstruct_lines};
use crate::utils::validate_image_dimensions;
use image::RgbImage;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extracts question/answer fields from form images.
///
/// Built once and shared; `analyze` takes `&self` and can be called from
/// several threads.
///
/// # Example
///
/// ```no_run
/// use kyc_form_digitizer::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let digitizer = FormDigitizerBuilder::new()
///     .word_detector(TesseractOcr::new().with_language("fra"))
///     .token_classifier(LayoutLmv3Classifier::from_model_dir("models/kyc-layoutlmv3")?)
///     .build()?;
///
/// let analysis = digitizer.analyze(&load_image("form.png")?)?;
/// print!("{analysis}");
/// # Ok(())
/// # }
/// ```
pub struct FormDigitizer {
    detector: Box<dyn WordDetector>,
    classifier: Box<dyn TokenClassifier>,
    grouper: LineGrouper,
}

impl fmt::Debug for FormDigitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormDigitizer")
            .field("detector", &self.detector.name())
            .field("classifier", &self.classifier.name())
            .field("grouper", &self.grouper)
            .finish()
    }
}

impl FormDigitizer {
    /// Creates a digitizer with the default line tolerance.
    pub fn new(
        detector: impl WordDetector + 'static,
        classifier: impl TokenClassifier + 'static,
    ) -> Self {
        Self {
            detector: Box::new(detector),
            classifier: Box::new(classifier),
            grouper: LineGrouper::default(),
        }
    }

    /// Builds the Tesseract + LayoutLMv3 digitizer described by `config`.
    ///
    /// Fails when the tesseract executable cannot be run or when a model
    /// resource is missing or invalid.
    pub fn from_config(config: &DigitizerConfig) -> Result<Self, DigitizerError> {
        config.validate()?;

        let mut ocr = TesseractOcr::new().with_command(&config.tesseract_cmd);
        if let Some(language) = &config.ocr_language {
            ocr = ocr.with_language(language);
        }
        if let Some(psm) = config.page_segmentation_mode {
            ocr = ocr.with_page_segmentation_mode(psm);
        }
        let version = ocr.check_available()?;
        info!(version = %version, "tesseract available");

        let mut classifier = LayoutLmv3ClassifierBuilder::from_model_dir(&config.model_dir)
            .max_sequence_length(config.max_sequence_length);
        if let Some(ort) = config.resolved_ort_session()? {
            classifier = classifier.with_ort_config(ort);
        }
        let classifier = classifier.build()?;
        info!(model_dir = %config.model_dir.display(), "classifier loaded");

        FormDigitizerBuilder::new()
            .word_detector(ocr)
            .token_classifier(classifier)
            .line_tolerance(config.line_tolerance)
            .build()
    }

    /// Returns the line grouper.
    pub fn line_grouper(&self) -> &LineGrouper {
        &self.grouper
    }

    /// Analyzes one form image.
    ///
    /// # Errors
    ///
    /// - [`DigitizerError::InvalidImage`] for a zero-sized image
    /// - [`DigitizerError::NoTextDetected`] when OCR finds no word
    /// - OCR and classifier errors as reported by the adapters
    pub fn analyze(&self, image: &RgbImage) -> Result<FormAnalysis, DigitizerError> {
        let start = Instant::now();
        validate_image_dimensions(image)?;
        let (width, height) = image.dimensions();

        let words = self.detector.detect_words(image)?;
        if words.is_empty() {
            return Err(DigitizerError::NoTextDetected);
        }

        let (texts, pixel_boxes): (Vec<String>, Vec<PixelBox>) =
            words.into_iter().map(|Word { text, bbox }| (text, bbox)).unzip();
        let boxes = normalize_boxes(&pixel_boxes, width, height)?;

        let classification = self.classifier.classify(image, &texts, &boxes)?;
        let token_count = classification.tokens.iter().filter(|t| !t.is_special).count();
        debug!(
            tokens = token_count,
            entity_tokens = classification.entity_token_count(),
            "classified"
        );

        let lines = reconstruct_lines(&classification, &self.grouper);
        let fields = format_fields(&lines);

        info!(
            words = texts.len(),
            lines = lines.len(),
            fields = fields.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "form analyzed"
        );

        let analysis = FormAnalysis {
            fields,
            lines,
            word_count: texts.len(),
            token_count,
        };
        if analysis.is_empty() {
            warn!(words = analysis.word_count, "no question or answer recognized");
        }
        Ok(analysis)
    }

    /// Rebuilds the fields of an existing classification result.
    pub fn extract_fields(&self, result: &ClassificationResult) -> Vec<Field> {
        format_fields(&reconstruct_lines(result, &self.grouper))
    }
}

/// Builder for [`FormDigitizer`].
#[derive(Default)]
pub struct FormDigitizerBuilder {
    detector: Option<Box<dyn WordDetector>>,
    classifier: Option<Box<dyn TokenClassifier>>,
    line_tolerance: Option<i64>,
}

impl FormDigitizerBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OCR engine.
    pub fn word_detector(mut self, detector: impl WordDetector + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Sets the token classifier.
    pub fn token_classifier(mut self, classifier: impl TokenClassifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Sets the vertical tolerance used to group entities into lines.
    pub fn line_tolerance(mut self, tolerance: i64) -> Self {
        self.line_tolerance = Some(tolerance);
        self
    }

    /// Builds the digitizer.
    pub fn build(self) -> Result<FormDigitizer, DigitizerError> {
        let detector = self.detector.ok_or_else(|| DigitizerError::ConfigError {
            message: "a word detector is required".to_string(),
        })?;
        let classifier = self.classifier.ok_or_else(|| DigitizerError::ConfigError {
            message: "a token classifier is required".to_string(),
        })?;

        let mut grouper = LineGrouper::default();
        if let Some(tolerance) = self.line_tolerance {
            if tolerance <= 0 {
                return Err(DigitizerError::ConfigError {
                    message: format!("line tolerance must be positive, got {tolerance}"),
                });
            }
            grouper = grouper.with_y_tolerance(tolerance);
        }

        Ok(FormDigitizer {
            detector,
            classifier,
            grouper,
        })
    }
}
