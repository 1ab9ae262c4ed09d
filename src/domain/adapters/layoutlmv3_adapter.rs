//! LayoutLMv3 Token Classification Adapter
//!
//! Pairs the LayoutLMv3 ONNX model with its Hugging Face tokenizer and label
//! table, and implements [`TokenClassifier`] on top of them.

use crate::core::config::OrtSessionConfig;
use crate::core::constants::DEFAULT_MAX_SEQUENCE_LENGTH;
use crate::core::errors::{DigitizerError, ProcessingStage};
use crate::core::traits::TokenClassifier;
use crate::domain::{ClassificationResult, ClassifiedToken};
use crate::models::classification::{
    LayoutLmv3Encoding, LayoutLmv3Model, LayoutLmv3ModelBuilder, SpecialTokenIds, WordPiece,
    load_id2label,
};
use crate::processors::NormalizedBox;
use image::RgbImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::debug;

/// ONNX graph file name inside a model directory.
pub const MODEL_FILE: &str = "model.onnx";
/// Tokenizer file name inside a model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Model config (label table) file name inside a model directory.
pub const CONFIG_FILE: &str = "config.json";

const CLS_TOKEN: &str = "<s>";
const SEP_TOKEN: &str = "</s>";
const PAD_TOKEN: &str = "<pad>";

/// Token classifier backed by a LayoutLMv3 model.
#[derive(Debug)]
pub struct LayoutLmv3Classifier {
    model: LayoutLmv3Model,
    tokenizer: Tokenizer,
    id2label: BTreeMap<usize, String>,
    special: SpecialTokenIds,
    max_sequence_length: usize,
}

impl LayoutLmv3Classifier {
    /// Loads the classifier from a directory holding `model.onnx`,
    /// `tokenizer.json` and `config.json`.
    pub fn from_model_dir(model_dir: impl AsRef<Path>) -> Result<Self, DigitizerError> {
        LayoutLmv3ClassifierBuilder::from_model_dir(model_dir).build()
    }

    /// Returns the label table.
    pub fn id2label(&self) -> &BTreeMap<usize, String> {
        &self.id2label
    }

    fn encode_word(&self, word: &str) -> Result<Vec<WordPiece>, DigitizerError> {
        // The leading space makes the first piece carry the word-start marker.
        let encoding = self
            .tokenizer
            .encode(format!(" {word}"), false)
            .map_err(|e| DigitizerError::Tokenizer {
                message: format!("failed to encode '{word}': {e}"),
            })?;
        Ok(encoding
            .get_ids()
            .iter()
            .zip(encoding.get_tokens())
            .map(|(&id, token)| WordPiece::new(id, token.as_str()))
            .collect())
    }

    fn decode(&self, id: u32) -> Result<String, DigitizerError> {
        self.tokenizer
            .decode(&[id], false)
            .map_err(|e| DigitizerError::Tokenizer {
                message: format!("failed to decode token {id}: {e}"),
            })
    }
}

impl TokenClassifier for LayoutLmv3Classifier {
    fn classify(
        &self,
        image: &RgbImage,
        words: &[String],
        boxes: &[NormalizedBox],
    ) -> Result<ClassificationResult, DigitizerError> {
        let pieces = words
            .iter()
            .map(|word| self.encode_word(word))
            .collect::<Result<Vec<_>, _>>()?;
        let encoding = LayoutLmv3Encoding::from_word_pieces(
            &pieces,
            boxes,
            self.special,
            self.max_sequence_length,
        )?;
        debug!(
            words = words.len(),
            tokens = encoding.attended_len(),
            "encoded words"
        );

        let predictions = self.model.forward(&encoding, image)?;
        let tokens = label_positions(&encoding, &predictions, &self.id2label, |id| {
            self.decode(id)
        })?;

        Ok(ClassificationResult::new(tokens, self.id2label.clone()))
    }

    fn name(&self) -> &str {
        "layoutlmv3"
    }
}

/// Turns per-position label ids into classified tokens.
///
/// `decode` maps a vocabulary id to its text; the text is trimmed. Markers
/// and padding become special tokens.
pub fn label_positions<F>(
    encoding: &LayoutLmv3Encoding,
    predictions: &[usize],
    id2label: &BTreeMap<usize, String>,
    decode: F,
) -> Result<Vec<ClassifiedToken>, DigitizerError>
where
    F: Fn(u32) -> Result<String, DigitizerError>,
{
    if predictions.len() != encoding.len() {
        return Err(DigitizerError::processing(
            ProcessingStage::Classification,
            "prediction count does not match the sequence",
            format!("{} predictions for {} tokens", predictions.len(), encoding.len()),
        ));
    }

    encoding
        .positions()
        .iter()
        .zip(predictions)
        .map(|(position, &label_id)| {
            let label = id2label.get(&label_id).ok_or_else(|| {
                DigitizerError::processing(
                    ProcessingStage::Classification,
                    "model predicted an unknown label",
                    format!("label id {label_id} is missing from id2label"),
                )
            })?;
            let text = decode(position.id)?;
            let text = text.trim();
            Ok(if position.is_special() {
                ClassifiedToken::special(text, label.as_str())
            } else {
                ClassifiedToken::new(text, label.as_str(), position.bbox, position.is_continuation)
            })
        })
        .collect()
}

/// Builder for [`LayoutLmv3Classifier`].
#[derive(Debug, Default)]
pub struct LayoutLmv3ClassifierBuilder {
    model_path: Option<PathBuf>,
    tokenizer_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    max_sequence_length: Option<usize>,
    ort_config: Option<OrtSessionConfig>,
}

impl LayoutLmv3ClassifierBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder pointing at the standard files of `model_dir`.
    pub fn from_model_dir(model_dir: impl AsRef<Path>) -> Self {
        let dir = model_dir.as_ref();
        Self::new()
            .model_path(dir.join(MODEL_FILE))
            .tokenizer_path(dir.join(TOKENIZER_FILE))
            .config_path(dir.join(CONFIG_FILE))
    }

    /// Sets the ONNX model path.
    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Sets the tokenizer path.
    pub fn tokenizer_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.tokenizer_path = Some(path.into());
        self
    }

    /// Sets the path of the `config.json` holding the label table.
    pub fn config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Sets the sequence length.
    pub fn max_sequence_length(mut self, length: usize) -> Self {
        self.max_sequence_length = Some(length);
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn with_ort_config(mut self, config: OrtSessionConfig) -> Self {
        self.ort_config = Some(config);
        self
    }

    /// Loads the label table, the tokenizer and the model.
    pub fn build(self) -> Result<LayoutLmv3Classifier, DigitizerError> {
        let required = |path: Option<PathBuf>, what: &str| {
            path.ok_or_else(|| DigitizerError::InvalidInput {
                message: format!("{what} path is required"),
            })
        };
        let model_path = required(self.model_path, "model")?;
        let tokenizer_path = required(self.tokenizer_path, "tokenizer")?;
        let config_path = required(self.config_path, "model config")?;

        let id2label = load_id2label(&config_path)?;
        let tokenizer = load_tokenizer(&tokenizer_path)?;
        let special = special_token_ids(&tokenizer, &tokenizer_path)?;

        let max_sequence_length = self
            .max_sequence_length
            .unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH);
        let mut model_builder =
            LayoutLmv3ModelBuilder::new().max_sequence_length(max_sequence_length);
        if let Some(config) = self.ort_config {
            model_builder = model_builder.with_ort_config(config);
        }
        let model = model_builder.build(&model_path)?;

        debug!(
            model = %model_path.display(),
            labels = id2label.len(),
            "loaded LayoutLMv3 classifier"
        );

        Ok(LayoutLmv3Classifier {
            model,
            tokenizer,
            id2label,
            special,
            max_sequence_length,
        })
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer, DigitizerError> {
    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
        DigitizerError::model_load_error(
            path,
            "failed to load tokenizer",
            Some("the model directory must contain the tokenizer.json matching the model"),
            Some(e),
        )
    })?;
    // Words are encoded one at a time; sequence-level padding and truncation
    // are applied afterwards.
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(None)
        .map_err(|e| DigitizerError::Tokenizer {
            message: format!("failed to disable truncation: {e}"),
        })?;
    Ok(tokenizer)
}

fn special_token_ids(tokenizer: &Tokenizer, path: &Path) -> Result<SpecialTokenIds, DigitizerError> {
    let id = |token: &str| {
        tokenizer.token_to_id(token).ok_or_else(|| {
            DigitizerError::model_load_error(
                path,
                format!("tokenizer has no '{token}' token"),
                Some("a RoBERTa-style LayoutLMv3 tokenizer is required"),
                None,
            )
        })
    };
    Ok(SpecialTokenIds {
        cls: id(CLS_TOKEN)?,
        sep: id(SEP_TOKEN)?,
        pad: id(PAD_TOKEN)?,
    })
}
