//! Tesseract OCR Adapter
//!
//! Runs the `tesseract` binary over an image and reads its word-level TSV
//! output.

use crate::core::errors::{DigitizerError, ProcessingStage};
use crate::core::traits::WordDetector;
use crate::domain::Word;
use crate::processors::PixelBox;
use crate::utils::encode_png;
use image::RgbImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Number of columns in a tesseract TSV row.
const TSV_COLUMNS: usize = 12;

/// Word detector backed by the Tesseract command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: PathBuf,
    language: Option<String>,
    page_segmentation_mode: Option<u8>,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
            language: None,
            page_segmentation_mode: None,
        }
    }
}

impl TesseractOcr {
    /// Creates a detector that runs `tesseract` from `PATH` with its defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path of the tesseract executable.
    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }

    /// Sets the recognition language(s), e.g. `fra` or `eng+fra`.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the page segmentation mode (`--psm`).
    pub fn with_page_segmentation_mode(mut self, psm: u8) -> Self {
        self.page_segmentation_mode = Some(psm);
        self
    }

    /// Returns the configured executable.
    pub fn command(&self) -> &Path {
        &self.command
    }

    /// Checks that the executable can be run and returns its version line.
    pub fn check_available(&self) -> Result<String, DigitizerError> {
        let output = Command::new(&self.command)
            .arg("--version")
            .output()
            .map_err(|e| {
                DigitizerError::model_load_error(
                    &self.command,
                    "tesseract executable could not be started",
                    Some("install tesseract or pass its path with --tesseract-cmd"),
                    Some(Box::new(e)),
                )
            })?;

        // Older releases print the version on stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Ok(text.lines().next().unwrap_or_default().trim().to_string())
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command.arg("stdin").arg("stdout");
        if let Some(language) = &self.language {
            command.arg("-l").arg(language);
        }
        if let Some(psm) = self.page_segmentation_mode {
            command.arg("--psm").arg(psm.to_string());
        }
        command.arg("tsv");
        command
    }
}

impl WordDetector for TesseractOcr {
    fn detect_words(&self, image: &RgbImage) -> Result<Vec<Word>, DigitizerError> {
        let png = encode_png(image)?;

        let mut child = self
            .build_command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DigitizerError::Ocr {
                message: format!("failed to start {}: {}", self.command.display(), e),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| DigitizerError::Ocr {
            message: "tesseract stdin was not captured".to_string(),
        })?;
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child.wait_with_output()?;
        let written = writer.join().map_err(|_| DigitizerError::Ocr {
            message: "image writer thread panicked".to_string(),
        })?;

        // A failing tesseract closes its stdin early; report its exit status
        // rather than the broken pipe.
        if !output.status.success() {
            return Err(DigitizerError::Ocr {
                message: format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        written?;

        let tsv = String::from_utf8_lossy(&output.stdout);
        let words = parse_tsv(&tsv)?;
        debug!(words = words.len(), "tesseract finished");
        Ok(words)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Parses tesseract TSV output into words.
///
/// Rows whose text is blank (page, block, paragraph and line rows, and empty
/// word rows) are dropped; the remaining rows keep their output order.
pub fn parse_tsv(tsv: &str) -> Result<Vec<Word>, DigitizerError> {
    let mut words = Vec::new();

    for (line_no, row) in tsv.lines().enumerate() {
        if row.starts_with("level\t") || row.trim().is_empty() {
            continue;
        }

        let columns: Vec<&str> = row.splitn(TSV_COLUMNS, '\t').collect();
        if columns.len() < TSV_COLUMNS {
            continue;
        }

        let text = columns[11];
        if text.trim().is_empty() {
            continue;
        }

        let coord = |index: usize| -> Result<u32, DigitizerError> {
            columns[index]
                .trim()
                .parse::<i64>()
                .map(|v| v.clamp(0, u32::MAX as i64) as u32)
                .map_err(|e| {
                    DigitizerError::processing(
                        ProcessingStage::WordDetection,
                        format!(
                            "invalid value '{}' in column {} of TSV row {}",
                            columns[index],
                            index + 1,
                            line_no + 1
                        ),
                        e,
                    )
                })
        };

        words.push(Word::new(
            text,
            PixelBox::new(coord(6)?, coord(7)?, coord(8)?, coord(9)?),
        ));
    }

    Ok(words)
}
