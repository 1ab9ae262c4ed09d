//! Constants shared across the pipeline.

/// Side length of the normalized coordinate grid used by LayoutLM-family models.
pub const NORMALIZED_GRID_SIZE: u32 = 1000;

/// Maximum vertical distance, in normalized units, between two consecutive
/// entities of the same visual line.
pub const LINE_Y_TOLERANCE: i64 = 15;

/// Question text shown for a line that only carries an answer ("Detected field").
pub const DETECTED_FIELD_PLACEHOLDER: &str = "Champ détecté";

/// Label the classifier assigns to tokens outside every entity.
pub const OUTSIDE_LABEL: &str = "O";

/// Default sequence length of the LayoutLMv3 encoder.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// Default side length of the square image fed to LayoutLMv3.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;
