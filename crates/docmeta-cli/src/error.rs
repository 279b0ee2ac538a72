use std::path::PathBuf;

use docmeta::{ConfigError, DocmetaError, PipelineError, ProcessError, ReportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Docmeta(#[from] DocmetaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Extraction(#[from] PipelineError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}
