//! Token classification models.

pub mod layoutlmv3;

pub use layoutlmv3::{
    LayoutLmv3Encoding, LayoutLmv3Model, LayoutLmv3ModelBuilder, LayoutLmv3PreprocessConfig,
    SequencePosition, SpecialTokenIds, WordPiece, argmax_labels, image_to_tensor, load_id2label,
    parse_id2label,
};
