pub mod chunking;
pub mod client;
pub mod document;
pub mod error;
pub mod metadata;
pub mod ocr;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ChatMessage, ChatModel, OpenAiChatClient};
pub use document::DocumentSummarizer;
pub use error::{LlmError, ReportError};
pub use metadata::{DocumentMetadata, MetadataGenerator, MetadataOutput};
pub use ocr::{OcrSummarizer, NO_OCR_CONTENT};
pub use report::{Analyzer, AnalyzerOptions, DocumentReport, ImageReport};
