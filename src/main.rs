mod config;
mod error;
mod har;
mod llm;
mod models;
mod pipeline;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use har::FileTranscriptSource;
use llm::OpenAiClassifier;
use pipeline::ApiReconPipeline;

#[derive(Parser)]
#[command(name = "api-recon")]
#[command(about = "Reverse-engineers minimal replayable API requests from browser network captures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recorded HAR transcript
    Analyze {
        /// Path to the HAR file
        har: PathBuf,
        /// HTTP method to focus on when grouping endpoints
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Directory for the report and intermediate artifacts
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start the web interface
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command {
        Commands::Analyze {
            har,
            method,
            output,
        } => {
            if let Some(output) = output {
                config.output_dir = output;
            }

            let api_key = config.openai_api_key.clone().unwrap_or_else(|| {
                tracing::warn!("OPENAI_API_KEY not set; endpoint classification will fail");
                String::new()
            });
            let classifier = Arc::new(OpenAiClassifier::new(api_key, config.openai_model.clone()));
            let pipeline = ApiReconPipeline::new(config.output_dir.clone(), classifier);

            let source = FileTranscriptSource::new(har);
            let report = pipeline.run_from_source(&source, &method).await?;

            println!("Documented {} endpoint(s)", report.endpoints.len());
            println!(
                "Report saved to: {}",
                config.output_dir.join("necessary_headers.json").display()
            );
        }
        Commands::Serve { port } => {
            println!("Starting web server on port {}...", port);
            web::run_server(port, config).await?;
        }
    }

    Ok(())
}
