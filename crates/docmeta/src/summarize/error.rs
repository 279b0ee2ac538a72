use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("LLM returned no completion")]
    EmptyResponse,

    #[error("LLM API key unavailable: {0}")]
    ApiKey(#[from] SecretError),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{message}")]
    Unsupported { message: String },

    #[error("No text or OCR content could be extracted from '{filename}'")]
    NoContent { filename: String },

    #[error(transparent)]
    Extraction(#[from] PipelineError),

    #[error("Summarization failed: {0}")]
    Llm(#[from] LlmError),
}
