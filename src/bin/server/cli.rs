//! CLI mode for form analysis.

use crate::analysis::{AnalyzeResponse, analyze_bytes, download_bytes};
use crate::config::ModelArgs;
use clap::ValueEnum;
use kyc_form_digitizer::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Output format of the `analyze` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Text,
}

/// Process an image at a URL
pub async fn process_url(
    url: &str,
    args: &ModelArgs,
    output_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();

    info!("Downloading image from URL...");
    let bytes = download_bytes(url).await?;
    info!(
        "Downloaded {} bytes in {:.2}ms",
        bytes.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let digitizer = load_digitizer(args)?;

    let analysis_start = Instant::now();
    let analysis = analyze_bytes(&digitizer, &bytes)?;
    let processing_time = analysis_start.elapsed();
    info!("Analysis completed in {:.2}ms", processing_time.as_secs_f64() * 1000.0);

    output_result(&analysis, output_format, processing_time.as_secs_f64() * 1000.0)
}

/// Process a local image file
pub fn process_file(
    path: &Path,
    args: &ModelArgs,
    output_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();

    info!("Loading image from file...");
    let image = load_image(path)?;
    info!("Loaded in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);

    let digitizer = load_digitizer(args)?;

    info!("Analyzing image ({}x{})...", image.width(), image.height());
    let analysis_start = Instant::now();
    let analysis = digitizer.analyze(&image)?;
    let processing_time = analysis_start.elapsed();
    info!("Analysis completed in {:.2}ms", processing_time.as_secs_f64() * 1000.0);

    output_result(&analysis, output_format, processing_time.as_secs_f64() * 1000.0)
}

fn load_digitizer(args: &ModelArgs) -> Result<FormDigitizer, DigitizerError> {
    info!("Initializing digitizer...");
    let start = Instant::now();
    let digitizer = FormDigitizer::from_config(&args.to_digitizer_config())?;
    info!("Digitizer initialized in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);
    Ok(digitizer)
}

/// Output the analysis in the specified format
fn output_result(
    analysis: &FormAnalysis,
    format: OutputFormat,
    processing_time_ms: f64,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match format {
        OutputFormat::Json => {
            let response = AnalyzeResponse::success(analysis.fields.clone(), processing_time_ms);
            println!("{}", serde_json::to_string(&response)?);
        }
        OutputFormat::Text => {
            print!("{analysis}");
        }
        OutputFormat::Pretty => print_fields(&analysis.fields, Some(analysis), processing_time_ms),
    }

    Ok(())
}

/// Prints fields as a readable form, shared with the remote client.
pub fn print_fields(fields: &[Field], analysis: Option<&FormAnalysis>, processing_time_ms: f64) {
    println!("\n=== Extracted Fields ===");
    println!("Processing time: {:.2}ms", processing_time_ms);
    if let Some(analysis) = analysis {
        println!("Words: {}", analysis.word_count);
        println!("Lines: {}", analysis.lines.len());
    }
    println!("Fields: {}", fields.len());
    println!();

    if fields.is_empty() {
        println!("No field detected.");
        return;
    }

    for (idx, field) in fields.iter().enumerate() {
        println!("[{}] {}", idx + 1, field.question);
        if field.answer.is_empty() {
            println!("    -");
        } else {
            println!("    {}", field.answer);
        }
    }
}
