//! Turns one uploaded document into a [`DocumentReport`]: extraction, then
//! metadata and summaries from the chat model.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::DocmetaError;
use crate::pipeline::{
    ExtractionResult, Extractor, NoopProgress, PipelineConfig, PipelineError, ProgressReporter,
    UploadedDocument,
};
use crate::processor::{DocumentFormat, ImageOrigin};

use super::client::{ChatModel, OpenAiChatClient};
use super::document::DocumentSummarizer;
use super::error::ReportError;
use super::metadata::{metadata_input, MetadataGenerator, MetadataOutput};
use super::ocr::OcrSummarizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Condense the document text before asking for metadata.
    pub summarize_before_metadata: bool,
    /// Append OCR text to the metadata input even when the document has text.
    pub include_ocr_text: bool,
    /// Inline every extracted image as base64 PNG in the report.
    pub embed_images: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            summarize_before_metadata: true,
            include_ocr_text: false,
            embed_images: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    /// 1-based, in extraction order.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub origin: ImageOrigin,
    pub ocr_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png_base64: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub filename: String,
    pub format: DocumentFormat,
    pub generated_at: DateTime<Utc>,
    pub metadata: MetadataOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_summary: Option<String>,
    pub images: Vec<ImageReport>,
}

pub struct Analyzer {
    extractor: Arc<Extractor>,
    progress: Arc<dyn ProgressReporter>,
    summarizer: DocumentSummarizer,
    metadata: MetadataGenerator,
    ocr: OcrSummarizer,
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(
        extractor: Arc<Extractor>,
        model: Arc<dyn ChatModel>,
        config: &Config,
        options: AnalyzerOptions,
    ) -> Self {
        let summarization = &config.summarization;
        Self {
            extractor,
            progress: Arc::new(NoopProgress),
            summarizer: DocumentSummarizer::new(
                model.clone(),
                summarization.chunk_chars,
                summarization.max_summary_words,
                config.llm.max_tokens,
            ),
            metadata: MetadataGenerator::new(model.clone()),
            ocr: OcrSummarizer::new(model, summarization.cache_capacity),
            options,
        }
    }

    /// Production wiring: Tesseract (if enabled) and the configured LLM endpoint.
    pub fn from_config(config: &Config) -> Result<Self, DocmetaError> {
        let extractor = Arc::new(Extractor::from_config(&PipelineConfig::from_config(config)));
        let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatClient::from_config(&config.llm)?);
        let options = AnalyzerOptions {
            summarize_before_metadata: config.summarization.summarize_before_metadata,
            include_ocr_text: config.summarization.include_ocr_text,
            embed_images: false,
        };
        Ok(Self::new(extractor, model, config, options))
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_embedded_images(mut self, embed: bool) -> Self {
        self.options.embed_images = embed;
        self
    }

    pub fn options(&self) -> AnalyzerOptions {
        self.options
    }

    /// Runs extraction on the blocking thread pool.
    pub async fn extract(
        &self,
        document: UploadedDocument,
    ) -> Result<ExtractionResult, PipelineError> {
        let extractor = self.extractor.clone();
        let progress = self.progress.clone();
        tokio::task::spawn_blocking(move || {
            extractor.extract_with_progress(&document, progress.as_ref())
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))?
    }

    pub async fn analyze(&self, document: UploadedDocument) -> Result<DocumentReport, ReportError> {
        let filename = document.filename.clone();
        let extraction = self.extract(document).await?;
        self.report(&filename, &extraction).await
    }

    /// Builds the report for an extraction that already ran.
    ///
    /// Refuses the unsupported sentinel and extractions with neither text nor
    /// OCR output; no metadata is invented for those.
    pub async fn report(
        &self,
        filename: &str,
        extraction: &ExtractionResult,
    ) -> Result<DocumentReport, ReportError> {
        let Some(format) = extraction.format() else {
            return Err(ReportError::Unsupported {
                message: extraction.primary_text().to_string(),
            });
        };
        if !extraction.has_content() {
            return Err(ReportError::NoContent {
                filename: filename.to_string(),
            });
        }

        let primary_text = extraction.primary_text();
        let ocr_text = extraction.ocr_text();

        let document_summary = if self.options.summarize_before_metadata && !primary_text.is_empty()
        {
            tracing::debug!("Summarizing document text");
            Some(self.summarizer.summarize(primary_text).await?)
        } else {
            None
        };

        let base = document_summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(primary_text);

        // Image-only documents have nothing but OCR text to describe them.
        let input = if base.is_empty() {
            ocr_text.to_string()
        } else if self.options.include_ocr_text {
            metadata_input(base, Some(ocr_text))
        } else {
            metadata_input(base, None)
        };

        tracing::debug!("Generating metadata from {} characters", input.len());
        let metadata = self.metadata.generate(&input).await;

        let mut images = Vec::with_capacity(extraction.images().len());
        for (i, (image, text)) in extraction.images_with_ocr().enumerate() {
            let summary = if text.trim().is_empty() {
                None
            } else {
                tracing::debug!("Summarizing OCR text of image {}", i + 1);
                Some(self.ocr.summarize(text).await)
            };

            let png_base64 = if self.options.embed_images {
                match image.to_png() {
                    Ok(png) => Some(STANDARD.encode(png)),
                    Err(e) => {
                        tracing::warn!("Could not encode image {} as PNG: {}", i + 1, e);
                        None
                    }
                }
            } else {
                None
            };

            images.push(ImageReport {
                index: i + 1,
                width: image.width(),
                height: image.height(),
                origin: image.origin().clone(),
                ocr_text: text.to_string(),
                summary,
                png_base64,
            });
        }

        let ocr_summary = if ocr_text.is_empty() {
            None
        } else {
            Some(self.ocr.summarize(ocr_text).await)
        };

        Ok(DocumentReport {
            filename: filename.to_string(),
            format,
            generated_at: Utc::now(),
            metadata,
            document_summary,
            ocr_summary,
            images,
        })
    }
}
