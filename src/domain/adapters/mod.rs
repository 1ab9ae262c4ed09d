//! Adapters implementing the pipeline traits on top of external engines.
//!
//! - [`TesseractOcr`] - [`WordDetector`](crate::core::traits::WordDetector) over the tesseract CLI
//! - [`LayoutLmv3Classifier`] - [`TokenClassifier`](crate::core::traits::TokenClassifier) over a LayoutLMv3 ONNX model

pub mod layoutlmv3_adapter;
pub mod tesseract_ocr_adapter;

pub use layoutlmv3_adapter::{LayoutLmv3Classifier, LayoutLmv3ClassifierBuilder, label_positions};
pub use tesseract_ocr_adapter::{TesseractOcr, parse_tsv};
