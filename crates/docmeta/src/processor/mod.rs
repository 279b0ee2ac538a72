pub mod docx;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod text;

#[cfg(test)]
pub(crate) mod fixtures;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProcessError;

pub use self::image::{ImageOrigin, RasterImage};
pub use self::ocr::{OcrEngine, TesseractOcr};

/// Formats the extraction core knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Maps a dotted suffix (`".pdf"`, case-insensitive) to a format.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_lowercase().as_str() {
            ".pdf" => Some(Self::Pdf),
            ".docx" => Some(Self::Docx),
            ".txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Docx => ".docx",
            Self::Text => ".txt",
        }
    }
}

/// Returns the lower-cased, dotted suffix of the final component of `filename`.
///
/// Names without an extension (`"notes"`, `".bashrc"`, `"draft."`) yield an
/// empty string.
pub fn file_suffix(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => String::new(),
    }
}

/// What a format handler produces before OCR runs.
#[derive(Debug, Default)]
pub struct ExtractedContent {
    /// Document-native text, untrimmed.
    pub text: String,
    /// Decoded images in encounter order.
    pub images: Vec<RasterImage>,
}

pub trait DocumentProcessor: Send + Sync {
    fn process(&self, path: &Path) -> Result<ExtractedContent, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        let processors: Vec<Box<dyn DocumentProcessor>> = vec![
            Box::new(text::TextProcessor::new()),
            Box::new(pdf::PdfProcessor::new()),
            Box::new(docx::DocxProcessor::new()),
        ];

        Self { processors }
    }

    /// Routes `path` to the handler for `format`.
    ///
    /// Returns `None` when no registered handler supports the format.
    pub fn process(
        &self,
        path: &Path,
        format: DocumentFormat,
    ) -> Option<Result<ExtractedContent, ProcessError>> {
        self.processors
            .iter()
            .find(|p| p.supports(format))
            .map(|p| p.process(path))
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
