//! KYC Form Digitizer Server and CLI
//!
//! A binary for extracting question/answer fields from KYC form images via
//! CLI, HTTP server or a remote server.
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! kyc-digitizer analyze --file form.png --model-dir models/kyc-layoutlmv3
//! kyc-digitizer analyze --url "https://example.com/form.jpg" --model-dir models/kyc-layoutlmv3 --output json
//! ```
//!
//! ## Server Mode
//! ```bash
//! kyc-digitizer serve --model-dir models/kyc-layoutlmv3 --port 8000
//! ```
//!
//! ## Remote Mode
//! ```bash
//! kyc-digitizer remote --file form.png --backend-url http://localhost:8000
//! ```

mod analysis;
mod cli;
mod client;
mod config;
mod server;

use clap::{Parser, Subcommand};
use cli::OutputFormat;
use config::ModelArgs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "kyc-digitizer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "KYC form field extraction via CLI or HTTP server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single form image
    Analyze {
        /// URL of the image to process
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,

        /// Local file path of the image to process
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value = "8000", env = "KYC_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "KYC_HOST")]
        host: String,

        /// Largest accepted upload, in megabytes
        #[arg(long = "max-upload-mb", default_value = "20", env = "KYC_MAX_UPLOAD_MB")]
        max_upload_mb: usize,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Send an image to a running server and print the fields
    Remote {
        /// Local file path of the image to send
        #[arg(long)]
        file: PathBuf,

        /// Base URL of the server
        #[arg(long = "backend-url", default_value = "http://localhost:8000", env = "BACKEND_URL")]
        backend_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    kyc_form_digitizer::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            url,
            file,
            output,
            model,
        } => {
            if let Some(url) = url {
                info!("Processing URL: {}", url);
                cli::process_url(&url, &model, output).await?;
            } else if let Some(file) = file {
                info!("Processing file: {}", file.display());
                cli::process_file(&file, &model, output)?;
            }
        }
        Commands::Serve {
            port,
            host,
            max_upload_mb,
            model,
        } => {
            let config = config::ServerConfig {
                digitizer: model.to_digitizer_config(),
                host,
                port,
                max_upload_bytes: max_upload_mb * 1024 * 1024,
            };

            info!("Starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
        Commands::Remote { file, backend_url } => {
            info!("Sending {} to {}", file.display(), backend_url);
            client::analyze_remote(&file, &backend_url).await?;
        }
    }

    Ok(())
}
