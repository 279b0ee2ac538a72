pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod secrets;
pub mod summarize;

pub use config::{load_config, load_or_default, Config};
pub use error::{ConfigError, DocmetaError, ProcessError, Result};
pub use pipeline::{ExtractionResult, Extractor, PipelineConfig, PipelineError, UploadedDocument};
pub use processor::{DocumentFormat, ImageOrigin, OcrEngine, RasterImage, TesseractOcr};
pub use secrets::{SecretError, SecretSource};
pub use summarize::{
    Analyzer, AnalyzerOptions, ChatModel, DocumentMetadata, DocumentReport, LlmError,
    MetadataOutput, OpenAiChatClient, ReportError,
};
