use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Document processing failed: {0}")]
    Processing(#[from] crate::error::ProcessError),

    #[error("Extraction task failed: {0}")]
    Task(String),
}
