//! # KYC Form Digitizer
//!
//! Extracts question/answer field pairs from scanned KYC (Know-Your-Customer)
//! form images.
//!
//! The pipeline runs OCR to find words and their positions, classifies every
//! token with a LayoutLMv3 token-classification model, and rebuilds the
//! classified tokens into readable lines of question/answer text.
//!
//! ## Pipeline
//!
//! 1. **OCR** ([`WordDetector`]) - image to words with pixel boxes
//! 2. **Normalization** ([`processors::normalize_box`]) - pixel boxes to the 0-1000 grid
//! 3. **Classification** ([`TokenClassifier`]) - words and boxes to per-token BIO labels
//! 4. **Entity merging** ([`processors::merge_entities`]) - tokens to labelled text spans
//! 5. **Line grouping** ([`processors::LineGrouper`]) - spans to visual rows
//! 6. **Field formatting** ([`processors::format_fields`]) - rows to question/answer pairs
//!
//! ## Modules
//!
//! * [`core`] - Error types, configuration, ONNX Runtime integration and adapter traits
//! * [`domain`] - Form data types and the OCR/classifier adapters
//! * [`models`] - The LayoutLMv3 ONNX model
//! * [`processors`] - The entity reconstruction algorithm
//! * [`digitizer`] - The [`FormDigitizer`] service tying everything together
//! * [`utils`] - Image loading and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kyc_form_digitizer::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DigitizerConfig::new("models/kyc-layoutlmv3");
//! let digitizer = FormDigitizer::from_config(&config)?;
//!
//! let image = load_image("form.png")?;
//! let analysis = digitizer.analyze(&image)?;
//!
//! for field in &analysis.fields {
//!     println!("{}: {}", field.question, field.answer);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod digitizer;
pub mod domain;
pub mod models;
pub mod processors;
pub mod utils;

pub use crate::core::traits::{TokenClassifier, WordDetector};
pub use crate::digitizer::{DigitizerConfig, FormAnalysis, FormDigitizer, FormDigitizerBuilder};

/// Prelude module for convenient imports.
///
/// ```rust
/// use kyc_form_digitizer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::config::{OrtExecutionProvider, OrtSessionConfig};
    pub use crate::core::errors::{DigitizerError, DigitizerResult};
    pub use crate::core::traits::{TokenClassifier, WordDetector};
    pub use crate::digitizer::{DigitizerConfig, FormAnalysis, FormDigitizer, FormDigitizerBuilder};
    pub use crate::domain::{
        ClassificationResult, ClassifiedToken, Entity, EntityLabel, Field, Line, Word,
    };
    pub use crate::domain::adapters::{LayoutLmv3Classifier, TesseractOcr};
    pub use crate::processors::{NormalizedBox, PixelBox};
    pub use crate::utils::{load_image, load_image_from_bytes};
}
