//! Model implementations.
//!
//! Models own an inference session and the tensor-level pre- and
//! postprocessing of one network. They know nothing about OCR or form
//! reconstruction; adapters in [`crate::domain::adapters`] wire them into
//! the pipeline.

pub mod classification;

pub use classification::{LayoutLmv3Model, LayoutLmv3ModelBuilder, LayoutLmv3PreprocessConfig};
