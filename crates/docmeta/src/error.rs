use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::secrets::SecretError;
use crate::summarize::{LlmError, ReportError};

#[derive(Error, Debug)]
pub enum DocmetaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write temporary file '{path}': {source}")]
    TempStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document '{path}' is not valid UTF-8: {source}")]
    TextEncoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process DOCX: {0}")]
    DocxProcessing(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),
}

pub type Result<T> = std::result::Result<T, DocmetaError>;
