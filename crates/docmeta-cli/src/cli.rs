use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "docmeta", version)]
#[command(about = "Extract text, images and OCR from documents and describe them with an LLM")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract text, images and OCR text without calling the LLM
    Extract {
        /// Document to read (.pdf, .docx or .txt)
        file: PathBuf,
        /// Write extracted images as PNG files into this directory
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },
    /// Extract, then generate metadata and summaries
    Analyze {
        /// Document to read (.pdf, .docx or .txt)
        file: PathBuf,
        /// Write the report JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write extracted images as PNG files into this directory
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// Inline images as base64 PNG in the report
        #[arg(long)]
        embed_images: bool,
    },
    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Default filter directive when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
