//! The form digitizer service.
//!
//! [`FormDigitizer`] runs OCR and token classification through the
//! [`WordDetector`](crate::core::traits::WordDetector) and
//! [`TokenClassifier`](crate::core::traits::TokenClassifier) traits, then
//! rebuilds question/answer fields from the classified tokens.

pub mod config;
pub mod result;
pub mod service;

pub use config::DigitizerConfig;
pub use service::{FormDigitizer, FormDigitizerBuilder};
pub use result::FormAnalysis;
