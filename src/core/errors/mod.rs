//! Error handling for the digitizer pipeline.

mod types;

pub use types::{DigitizerError, DigitizerResult, ProcessingStage};
