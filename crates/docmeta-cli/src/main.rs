mod cli;
mod error;
mod output;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use docmeta::pipeline::{LogProgress, PipelineConfig};
use docmeta::sanitize::redact_path;
use docmeta::{load_or_default, Analyzer, Config, Extractor, UploadedDocument};
use log::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::{redacted_config, write_images, write_json, ExtractionView};

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    // Logs go to stderr; stdout carries the JSON output.
    let installed = if cli.log_json {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    };

    if installed {
        // Route `log` records from dependencies into tracing.
        let _ = tracing_log::LogTracer::init();
    }
}

fn extract(config: &Config, file: &Path, images_dir: Option<&Path>) -> Result<(), CliError> {
    let document = UploadedDocument::from_path(file)?;
    let extractor = Extractor::from_config(&PipelineConfig::from_config(config));
    let extraction = extractor.extract_with_progress(&document, &LogProgress)?;

    if let Some(dir) = images_dir {
        let written = write_images(dir, &document.filename, &extraction)?;
        info!("Wrote {} image(s) to {}", written.len(), dir.display());
    }

    write_json(&ExtractionView::new(&document.filename, &extraction), None)
}

async fn analyze(
    config: &Config,
    file: &Path,
    output: Option<&Path>,
    images_dir: Option<&Path>,
    embed_images: bool,
) -> Result<(), CliError> {
    let document = UploadedDocument::from_path(file)?;
    let filename = document.filename.clone();

    let analyzer = Analyzer::from_config(config)?
        .with_progress(Arc::new(LogProgress))
        .with_embedded_images(embed_images);

    let extraction = analyzer.extract(document).await?;

    if let Some(dir) = images_dir {
        if !extraction.is_unsupported() {
            let written = write_images(dir, &filename, &extraction)?;
            info!("Wrote {} image(s) to {}", written.len(), dir.display());
        }
    }

    let report = analyzer.report(&filename, &extraction).await?;
    write_json(&report, output)?;

    if let Some(path) = output {
        info!("Report written to {}", redact_path(path));
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { file, images_dir } => {
            let images_dir = images_dir.as_deref();
            tokio::task::block_in_place(|| extract(&config, &file, images_dir))
        }
        Commands::Analyze {
            file,
            output,
            images_dir,
            embed_images,
        } => {
            analyze(
                &config,
                &file,
                output.as_deref(),
                images_dir.as_deref(),
                embed_images,
            )
            .await
        }
        Commands::Config => write_json(&redacted_config(&config), None),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    info!("docmeta v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
