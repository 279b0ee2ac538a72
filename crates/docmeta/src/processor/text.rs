use std::path::Path;

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor, ExtractedContent};

/// Plain-text documents: the file content is the text, there are no images.
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for TextProcessor {
    fn process(&self, path: &Path) -> Result<ExtractedContent, ProcessError> {
        let _span = tracing::info_span!("processor.text").entered();

        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let text = String::from_utf8(bytes).map_err(|e| ProcessError::TextEncoding {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(ExtractedContent {
            text,
            images: Vec::new(),
        })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}
