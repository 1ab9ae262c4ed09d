//! Configuration types for the digitizer server and CLI.

use clap::Args;
use kyc_form_digitizer::DigitizerConfig;
use kyc_form_digitizer::core::constants::{DEFAULT_MAX_SEQUENCE_LENGTH, LINE_Y_TOLERANCE};
use std::path::PathBuf;

/// Options shared by every command that loads the pipeline.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Directory holding model.onnx, tokenizer.json and config.json
    #[arg(long = "model-dir", env = "KYC_MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Device to use (cpu, cuda, cuda:0, etc.)
    #[arg(long, default_value = "cpu", env = "KYC_DEVICE")]
    pub device: String,

    /// Path to the tesseract executable
    #[arg(long = "tesseract-cmd", default_value = "tesseract", env = "KYC_TESSERACT_CMD")]
    pub tesseract_cmd: PathBuf,

    /// Tesseract language(s), e.g. fra or eng+fra
    #[arg(long = "ocr-lang", env = "KYC_OCR_LANG")]
    pub ocr_lang: Option<String>,

    /// Tesseract page segmentation mode
    #[arg(long, env = "KYC_PSM")]
    pub psm: Option<u8>,

    /// Vertical tolerance for grouping entities into lines (0-1000 grid)
    #[arg(long = "line-tolerance", default_value_t = LINE_Y_TOLERANCE, env = "KYC_LINE_TOLERANCE")]
    pub line_tolerance: i64,

    /// Classifier sequence length
    #[arg(long = "max-seq-len", default_value_t = DEFAULT_MAX_SEQUENCE_LENGTH, env = "KYC_MAX_SEQ_LEN")]
    pub max_sequence_length: usize,
}

impl ModelArgs {
    pub fn to_digitizer_config(&self) -> DigitizerConfig {
        let mut config = DigitizerConfig::new(&self.model_dir)
            .with_device(&self.device)
            .with_tesseract_cmd(&self.tesseract_cmd)
            .with_line_tolerance(self.line_tolerance)
            .with_max_sequence_length(self.max_sequence_length);
        if let Some(lang) = &self.ocr_lang {
            config = config.with_ocr_language(lang);
        }
        if let Some(psm) = self.psm {
            config = config.with_page_segmentation_mode(psm);
        }
        config
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub digitizer: DigitizerConfig,
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}
