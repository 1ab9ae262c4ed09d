//! LayoutLMv3 Model
//!
//! This module provides the LayoutLMv3 token classification model run with
//! ONNX Runtime. It turns an already tokenized sequence plus the page image
//! into one predicted label id per sequence position. Tokenization itself
//! lives in the classifier adapter.

use crate::core::config::OrtSessionConfig;
use crate::core::constants::{DEFAULT_IMAGE_SIZE, DEFAULT_MAX_SEQUENCE_LENGTH};
use crate::core::errors::{DigitizerError, ProcessingStage};
use crate::core::inference::{OrtInfer, TensorInput};
use crate::processors::NormalizedBox;
use image::RgbImage;
use image::imageops::FilterType;
use ndarray::{Array2, Array3, Array4, Axis};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const MODEL_NAME: &str = "LayoutLMv3";

/// Preprocessing configuration for the LayoutLMv3 model.
#[derive(Debug, Clone)]
pub struct LayoutLmv3PreprocessConfig {
    /// Side of the square image fed to the visual backbone
    pub image_size: u32,
    /// Channel-wise normalization mean
    pub normalize_mean: [f32; 3],
    /// Channel-wise normalization std
    pub normalize_std: [f32; 3],
    /// Fixed text sequence length (truncation and padding target)
    pub max_sequence_length: usize,
}

impl Default for LayoutLmv3PreprocessConfig {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            normalize_mean: [0.5, 0.5, 0.5],
            normalize_std: [0.5, 0.5, 0.5],
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        }
    }
}

/// Ids of the tokenizer's sequence markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokenIds {
    /// Start of sequence (`<s>`)
    pub cls: u32,
    /// End of sequence (`</s>`)
    pub sep: u32,
    /// Padding (`<pad>`)
    pub pad: u32,
}

/// One sub-word piece produced by the tokenizer for a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPiece {
    /// Vocabulary id
    pub id: u32,
    /// Raw vocabulary entry, e.g. `ĠJohn`
    pub token: String,
}

impl WordPiece {
    /// Creates a new piece.
    pub fn new(id: u32, token: impl Into<String>) -> Self {
        Self {
            id,
            token: token.into(),
        }
    }

    /// True when the piece starts a new word (byte-level BPE space marker).
    pub fn starts_word(&self) -> bool {
        self.token.starts_with('Ġ')
    }
}

/// One position of the encoded sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePosition {
    /// Vocabulary id
    pub id: u32,
    /// Index of the source word, `None` for markers and padding
    pub word_index: Option<usize>,
    /// True when the piece continues the previous piece's word
    pub is_continuation: bool,
    /// Box of the source word, zero for markers and padding
    pub bbox: NormalizedBox,
}

impl SequencePosition {
    fn special(id: u32) -> Self {
        Self {
            id,
            word_index: None,
            is_continuation: false,
            bbox: NormalizedBox::ZERO,
        }
    }

    /// True for sequence markers and padding.
    pub fn is_special(&self) -> bool {
        self.word_index.is_none()
    }
}

/// A fixed-length LayoutLMv3 text encoding.
///
/// Layout is `<s>`, the pieces of every word in order, `</s>`, then `<pad>`
/// up to the sequence length. Pieces that do not fit are dropped, `</s>` is
/// always kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLmv3Encoding {
    positions: Vec<SequencePosition>,
    attended: usize,
}

impl LayoutLmv3Encoding {
    /// Builds the encoding from the pieces of each word and the word boxes.
    pub fn from_word_pieces(
        pieces: &[Vec<WordPiece>],
        boxes: &[NormalizedBox],
        special: SpecialTokenIds,
        max_length: usize,
    ) -> Result<Self, DigitizerError> {
        if pieces.len() != boxes.len() {
            return Err(DigitizerError::InvalidInput {
                message: format!(
                    "got {} words but {} boxes",
                    pieces.len(),
                    boxes.len()
                ),
            });
        }
        if max_length < 2 {
            return Err(DigitizerError::ConfigError {
                message: format!("sequence length {max_length} cannot hold the start and end markers"),
            });
        }

        let mut positions = Vec::with_capacity(max_length);
        positions.push(SequencePosition::special(special.cls));

        let budget = max_length - 2;
        'words: for (word_index, (word_pieces, bbox)) in pieces.iter().zip(boxes).enumerate() {
            for piece in word_pieces {
                if positions.len() - 1 == budget {
                    break 'words;
                }
                positions.push(SequencePosition {
                    id: piece.id,
                    word_index: Some(word_index),
                    is_continuation: !piece.starts_word(),
                    bbox: *bbox,
                });
            }
        }

        positions.push(SequencePosition::special(special.sep));
        let attended = positions.len();
        positions.resize(max_length, SequencePosition::special(special.pad));

        Ok(Self {
            positions,
            attended,
        })
    }

    /// Returns every position, padding included.
    pub fn positions(&self) -> &[SequencePosition] {
        &self.positions
    }

    /// Sequence length.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if the encoding has no position.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of non-padding positions.
    pub fn attended_len(&self) -> usize {
        self.attended
    }

    /// `input_ids` tensor `[1, seq]`.
    pub fn input_ids(&self) -> Array2<i64> {
        Array2::from_shape_fn((1, self.len()), |(_, i)| self.positions[i].id as i64)
    }

    /// `attention_mask` tensor `[1, seq]`.
    pub fn attention_mask(&self) -> Array2<i64> {
        Array2::from_shape_fn((1, self.len()), |(_, i)| (i < self.attended) as i64)
    }

    /// `bbox` tensor `[1, seq, 4]`.
    pub fn bbox(&self) -> Array3<i64> {
        Array3::from_shape_fn((1, self.len(), 4), |(_, i, c)| {
            self.positions[i].bbox.to_array()[c]
        })
    }
}

#[derive(Debug, Deserialize)]
struct ModelConfigFile {
    id2label: HashMap<String, String>,
}

/// Reads the `id2label` table of a Hugging Face `config.json`.
pub fn load_id2label(path: &Path) -> Result<BTreeMap<usize, String>, DigitizerError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DigitizerError::model_load_error(
            path,
            "failed to read model config",
            Some("the model directory must contain the config.json exported with the model"),
            Some(Box::new(e)),
        )
    })?;
    parse_id2label(&content).map_err(|e| {
        DigitizerError::model_load_error(path, e.to_string(), None, None)
    })
}

/// Parses the `id2label` table of a model config document.
pub fn parse_id2label(content: &str) -> Result<BTreeMap<usize, String>, DigitizerError> {
    let config: ModelConfigFile =
        serde_json::from_str(content).map_err(|e| DigitizerError::ConfigError {
            message: format!("invalid model config: {e}"),
        })?;

    let mut labels = BTreeMap::new();
    for (id, label) in config.id2label {
        let id = id.parse::<usize>().map_err(|_| DigitizerError::ConfigError {
            message: format!("label id '{id}' is not an integer"),
        })?;
        labels.insert(id, label);
    }
    if labels.is_empty() {
        return Err(DigitizerError::ConfigError {
            message: "model config has an empty id2label table".to_string(),
        });
    }
    Ok(labels)
}

/// Resizes `image` to the configured square (bilinear) and normalizes it
/// into a `[1, 3, S, S]` tensor.
pub fn image_to_tensor(image: &RgbImage, config: &LayoutLmv3PreprocessConfig) -> Array4<f32> {
    let size = config.image_size;
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
    let mean = config.normalize_mean;
    let std = config.normalize_std;

    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - mean[c]) / std[c];
        }
    }
    tensor
}

/// Returns the index of the largest logit of every sequence position.
///
/// Expects logits shaped `[1, seq, num_labels]`.
pub fn argmax_labels(logits: &Array3<f32>) -> Vec<usize> {
    logits
        .index_axis(Axis(0), 0)
        .outer_iter()
        .map(|scores| {
            scores
                .iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                    if v > best.1 { (i, v) } else { best }
                })
                .0
        })
        .collect()
}

/// LayoutLMv3 token classification model.
///
/// - Preprocessing: page image to a normalized `[1, 3, S, S]` tensor
/// - Inference: text, layout and image through the ONNX graph
/// - Postprocessing: argmax over the label logits
#[derive(Debug)]
pub struct LayoutLmv3Model {
    inference: OrtInfer,
    config: LayoutLmv3PreprocessConfig,
}

impl LayoutLmv3Model {
    /// Creates a model from a loaded inference engine.
    pub fn new(inference: OrtInfer, config: LayoutLmv3PreprocessConfig) -> Self {
        Self { inference, config }
    }

    /// Returns the preprocessing configuration.
    pub fn config(&self) -> &LayoutLmv3PreprocessConfig {
        &self.config
    }

    /// Resizes and normalizes the page image into `pixel_values`.
    pub fn preprocess_image(&self, image: &RgbImage) -> Array4<f32> {
        image_to_tensor(image, &self.config)
    }

    /// Runs the graph and returns the logits `[1, seq, num_labels]`.
    pub fn infer(
        &self,
        encoding: &LayoutLmv3Encoding,
        pixel_values: &Array4<f32>,
    ) -> Result<Array3<f32>, DigitizerError> {
        let input_ids = encoding.input_ids();
        let attention_mask = encoding.attention_mask();
        let bbox = encoding.bbox();

        let output = self
            .inference
            .infer(
                &[
                    ("input_ids", TensorInput::I64x2(&input_ids)),
                    ("attention_mask", TensorInput::I64x2(&attention_mask)),
                    ("bbox", TensorInput::I64x3(&bbox)),
                    ("pixel_values", TensorInput::F32x4(pixel_values)),
                ],
                "logits",
            )
            .map_err(|e| DigitizerError::Inference {
                model_name: MODEL_NAME.to_string(),
                context: format!(
                    "failed to run inference on a sequence of {} tokens",
                    encoding.len()
                ),
                source: Some(Box::new(e)),
            })?;

        let logits = output.try_into_array3()?;
        if logits.shape()[1] != encoding.len() {
            return Err(DigitizerError::processing(
                ProcessingStage::Classification,
                "logits do not match the input sequence",
                format!(
                    "expected {} positions, got {}",
                    encoding.len(),
                    logits.shape()[1]
                ),
            ));
        }
        Ok(logits)
    }

    /// Runs the complete forward pass and returns one label id per position.
    pub fn forward(
        &self,
        encoding: &LayoutLmv3Encoding,
        image: &RgbImage,
    ) -> Result<Vec<usize>, DigitizerError> {
        let pixel_values = self.preprocess_image(image);
        let logits = self.infer(encoding, &pixel_values)?;
        Ok(argmax_labels(&logits))
    }
}

/// Builder for the LayoutLMv3 model.
#[derive(Debug, Default)]
pub struct LayoutLmv3ModelBuilder {
    preprocess_config: Option<LayoutLmv3PreprocessConfig>,
    ort_config: Option<OrtSessionConfig>,
}

impl LayoutLmv3ModelBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the preprocessing configuration.
    pub fn preprocess_config(mut self, config: LayoutLmv3PreprocessConfig) -> Self {
        self.preprocess_config = Some(config);
        self
    }

    /// Sets the sequence length.
    pub fn max_sequence_length(mut self, length: usize) -> Self {
        let mut config = self.preprocess_config.unwrap_or_default();
        config.max_sequence_length = length;
        self.preprocess_config = Some(config);
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn with_ort_config(mut self, config: OrtSessionConfig) -> Self {
        self.ort_config = Some(config);
        self
    }

    /// Builds the model from an ONNX file.
    pub fn build(self, model_path: &Path) -> Result<LayoutLmv3Model, DigitizerError> {
        let inference = match &self.ort_config {
            Some(config) => OrtInfer::from_config(model_path, MODEL_NAME, config)?,
            None => OrtInfer::new(model_path, MODEL_NAME)?,
        };
        Ok(LayoutLmv3Model::new(
            inference,
            self.preprocess_config.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECIAL: SpecialTokenIds = SpecialTokenIds {
        cls: 0,
        sep: 2,
        pad: 1,
    };

    fn boxes(n: u32) -> Vec<NormalizedBox> {
        (0..n).map(|i| NormalizedBox::new(i * 10, 5, i * 10 + 8, 15)).collect()
    }

    #[test]
    fn test_encoding_layout() {
        let pieces = vec![
            vec![WordPiece::new(10, "ĠName")],
            vec![WordPiece::new(11, "ĠJo"), WordPiece::new(12, "hn")],
        ];
        let encoding =
            LayoutLmv3Encoding::from_word_pieces(&pieces, &boxes(2), SPECIAL, 8).unwrap();

        let ids: Vec<u32> = encoding.positions().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 10, 11, 12, 2, 1, 1, 1]);
        assert_eq!(encoding.attended_len(), 5);

        let p = encoding.positions();
        assert!(p[0].is_special() && p[4].is_special() && p[7].is_special());
        assert_eq!(p[0].bbox, NormalizedBox::ZERO);
        assert!(!p[2].is_continuation);
        assert!(p[3].is_continuation);
        assert_eq!(p[2].bbox, p[3].bbox);
        assert_eq!(p[3].word_index, Some(1));

        assert_eq!(
            encoding.attention_mask().row(0).to_vec(),
            vec![1, 1, 1, 1, 1, 0, 0, 0]
        );
        let bbox = encoding.bbox();
        assert_eq!(bbox.shape(), &[1, 8, 4]);
        assert_eq!(bbox[[0, 3, 0]], 10);
        assert_eq!(bbox[[0, 3, 2]], 18);
        assert_eq!(bbox[[0, 7, 2]], 0);
        assert_eq!(encoding.input_ids().shape(), &[1, 8]);
    }

    #[test]
    fn test_encoding_truncates_and_keeps_end_marker() {
        let pieces: Vec<Vec<WordPiece>> = (0..10)
            .map(|i| vec![WordPiece::new(100 + i, format!("Ġw{i}"))])
            .collect();
        let encoding =
            LayoutLmv3Encoding::from_word_pieces(&pieces, &boxes(10), SPECIAL, 5).unwrap();

        let ids: Vec<u32> = encoding.positions().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 100, 101, 102, 2]);
        assert_eq!(encoding.attended_len(), 5);
    }

    #[test]
    fn test_encoding_without_words() {
        let encoding = LayoutLmv3Encoding::from_word_pieces(&[], &[], SPECIAL, 4).unwrap();
        let ids: Vec<u32> = encoding.positions().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 2, 1, 1]);
    }

    #[test]
    fn test_encoding_rejects_mismatched_inputs() {
        let pieces = vec![vec![WordPiece::new(1, "Ġa")]];
        assert!(matches!(
            LayoutLmv3Encoding::from_word_pieces(&pieces, &boxes(2), SPECIAL, 8),
            Err(DigitizerError::InvalidInput { .. })
        ));
        assert!(matches!(
            LayoutLmv3Encoding::from_word_pieces(&pieces, &boxes(1), SPECIAL, 1),
            Err(DigitizerError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_parse_id2label() {
        let labels = parse_id2label(
            r#"{"model_type":"layoutlmv3","id2label":{"0":"O","1":"B-QUESTION","2":"I-QUESTION","10":"B-ANSWER"}}"#,
        )
        .unwrap();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[&1], "B-QUESTION");
        assert_eq!(labels[&10], "B-ANSWER");

        assert!(parse_id2label(r#"{"id2label":{"x":"O"}}"#).is_err());
        assert!(parse_id2label(r#"{"id2label":{}}"#).is_err());
        assert!(parse_id2label("{}").is_err());
    }

    #[test]
    fn test_load_id2label_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_id2label(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, DigitizerError::ModelLoad { .. }));
    }

    #[test]
    fn test_image_to_tensor_scales_to_unit_range() {
        let image = RgbImage::from_pixel(37, 50, image::Rgb([255, 0, 255]));
        let config = LayoutLmv3PreprocessConfig {
            image_size: 16,
            ..Default::default()
        };
        let tensor = image_to_tensor(&image, &config);
        assert_eq!(tensor.shape(), &[1, 3, 16, 16]);
        assert!((tensor[[0, 0, 3, 7]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 3, 7]] + 1.0).abs() < 1e-6);
        assert!((tensor[[0, 2, 15, 15]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_labels() {
        let logits = Array3::from_shape_vec(
            (1, 3, 3),
            vec![0.1, 0.9, 0.0, 2.0, -1.0, 1.5, -3.0, -2.0, -1.0],
        )
        .unwrap();
        assert_eq!(argmax_labels(&logits), vec![1, 0, 2]);
    }
}
