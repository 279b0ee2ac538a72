use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info_span, warn};

use crate::error::ProcessError;
use crate::processor::{
    file_suffix, DocumentFormat, ExtractedContent, OcrEngine, ProcessorRegistry, TesseractOcr,
};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::materialize::MaterializedFile;
use super::progress::{ExtractionPhase, NoopProgress, ProgressEvent, ProgressReporter};
use super::result::ExtractionResult;
use super::upload::UploadedDocument;

/// Turns an uploaded document into an [`ExtractionResult`].
///
/// Holds no per-request state; one instance may serve many documents,
/// including from several threads at once.
pub struct Extractor {
    registry: ProcessorRegistry,
    ocr: Option<Arc<dyn OcrEngine>>,
    temp_directory: PathBuf,
}

impl Extractor {
    /// Production constructor: Tesseract OCR when enabled in config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let ocr: Option<Arc<dyn OcrEngine>> = if config.ocr_enabled {
            Some(Arc::new(TesseractOcr::new(
                &config.ocr_languages,
                config.ocr_dpi,
            )))
        } else {
            None
        };

        Self::new(ocr, config.temp_directory.clone())
    }

    /// `ocr = None` disables recognition: every image gets an empty string.
    pub fn new(ocr: Option<Arc<dyn OcrEngine>>, temp_directory: impl Into<PathBuf>) -> Self {
        Self {
            registry: ProcessorRegistry::new(),
            ocr,
            temp_directory: temp_directory.into(),
        }
    }

    pub fn extract(&self, document: &UploadedDocument) -> Result<ExtractionResult, PipelineError> {
        self.extract_with_progress(document, &NoopProgress)
    }

    pub fn extract_with_progress(
        &self,
        document: &UploadedDocument,
        progress: &dyn ProgressReporter,
    ) -> Result<ExtractionResult, PipelineError> {
        let suffix = file_suffix(&document.filename);
        let _span = info_span!("extract",
            suffix = %suffix,
            bytes = document.bytes.len(),
        )
        .entered();

        let Some(format) = DocumentFormat::from_suffix(&suffix) else {
            debug!("No handler for suffix '{}'", suffix);
            let result = ExtractionResult::unsupported(&suffix);
            progress.report(ProgressEvent::Completed {
                format: None,
                images: 0,
                text_chars: 0,
            });
            return Ok(result);
        };

        match self.run(document, format, &suffix, progress) {
            Ok(result) => {
                progress.report(ProgressEvent::Completed {
                    format: Some(format),
                    images: result.images().len(),
                    text_chars: result.primary_text().chars().count(),
                });
                Ok(result)
            }
            Err(e) => {
                progress.report(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    fn run(
        &self,
        document: &UploadedDocument,
        format: DocumentFormat,
        suffix: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<ExtractionResult, ProcessError> {
        // Step 1: Write the upload to disk. The guard removes it on every return path.
        let materialized = {
            let _step = info_span!("materialize").entered();
            progress.report(ProgressEvent::Phase {
                phase: ExtractionPhase::Materializing,
                message: "Writing upload to temporary storage...".to_string(),
            });
            MaterializedFile::create(&self.temp_directory, suffix, &document.bytes)?
        };

        // Step 2: Format-specific extraction
        let content = {
            let _step = info_span!("process_document").entered();
            progress.report(ProgressEvent::Phase {
                phase: ExtractionPhase::Extracting,
                message: format!("Extracting text and images ({})...", format.suffix()),
            });
            match self.registry.process(materialized.path(), format) {
                Some(result) => result?,
                // Every DocumentFormat has a registered handler.
                None => ExtractedContent::default(),
            }
        };

        // Step 3: OCR every image, in order
        let ocr_texts = {
            let _step = info_span!("ocr", images = content.images.len()).entered();
            if !content.images.is_empty() {
                progress.report(ProgressEvent::Phase {
                    phase: ExtractionPhase::Recognizing,
                    message: format!("Running OCR on {} image(s)...", content.images.len()),
                });
            }
            self.recognize_all(&content, progress)
        };

        drop(materialized);

        Ok(ExtractionResult::assemble(format, content, ocr_texts))
    }

    fn recognize_all(
        &self,
        content: &ExtractedContent,
        progress: &dyn ProgressReporter,
    ) -> Vec<String> {
        let total = content.images.len();

        content
            .images
            .iter()
            .enumerate()
            .map(|(idx, image)| {
                let text = match &self.ocr {
                    None => String::new(),
                    Some(engine) => match engine.recognize(image) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("OCR failed for image {}/{}: {}", idx + 1, total, e);
                            String::new()
                        }
                    },
                };

                progress.report(ProgressEvent::ImageRecognized {
                    index: idx + 1,
                    total,
                    chars: text.chars().count(),
                });
                text
            })
            .collect()
    }
}
