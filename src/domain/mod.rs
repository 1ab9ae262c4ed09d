//! Domain types of the digitizer and the adapters to external engines.
//!
//! - [`form`] - words, entities, lines and fields
//! - [`classification`] - per-token classifier output
//! - [`adapters`] - OCR and classifier implementations of the core traits

pub mod adapters;
pub mod classification;
pub mod form;

pub use classification::{ClassificationResult, ClassifiedToken};
pub use form::{Entity, EntityLabel, Field, Line, Word};
