//! Test harness for isolated extraction runs.
//!
//! The `TestHarness` owns a scratch directory used as the extractor's temp
//! directory, so tests can check that nothing is left behind, and a
//! deterministic OCR engine that records how often it was called.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use docmeta::error::ProcessError;
use docmeta::summarize::{ChatMessage, ChatModel, LlmError};
use docmeta::{ExtractionResult, Extractor, OcrEngine, PipelineError, RasterImage, UploadedDocument};

/// OCR engine that "recognizes" an image as its dimensions, e.g. `"40x20"`.
///
/// Images wider than `fail_wider_than` make it fail.
pub struct SizeOcr {
    calls: AtomicUsize,
    fail_wider_than: u32,
}

impl SizeOcr {
    pub fn new() -> Self {
        Self::failing_above(u32::MAX)
    }

    pub fn failing_above(width: u32) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_wider_than: width,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for SizeOcr {
    fn recognize(&self, image: &RasterImage) -> Result<String, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if image.width() > self.fail_wider_than {
            return Err(ProcessError::OcrFailed("simulated engine crash".to_string()));
        }
        Ok(format!("{}x{}", image.width(), image.height()))
    }
}

/// Chat model answering by prompt kind, recording every user prompt.
pub struct CannedChat {
    prompts: Mutex<Vec<String>>,
}

impl CannedChat {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for CannedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt.clone());

        Ok(if prompt.contains("OCR Text:") {
            "The following image contains a checkerboard.".to_string()
        } else if prompt.contains("Document Content:") {
            r#"Sure! ```json
{"title": "Fixture", "summary": "A test document.", "keywords": "test, fixture",
 "topics": ["Testing"], "author": null, "document_type": "report"}
```"#
                .to_string()
        } else {
            "A short summary of the document.".to_string()
        })
    }
}

/// Isolated extraction environment.
pub struct TestHarness {
    temp_dir: TempDir,
    pub ocr: Arc<SizeOcr>,
    pub extractor: Arc<Extractor>,
}

impl TestHarness {
    /// A harness whose OCR engine never fails.
    pub fn new() -> Self {
        Self::with_ocr(SizeOcr::new())
    }

    pub fn with_ocr(ocr: SizeOcr) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let ocr = Arc::new(ocr);
        let engine: Arc<dyn OcrEngine> = ocr.clone();
        let extractor = Arc::new(Extractor::new(Some(engine), temp_dir.path()));
        Self {
            temp_dir,
            ocr,
            extractor,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn extract(&self, filename: &str, bytes: Vec<u8>) -> Result<ExtractionResult, PipelineError> {
        self.extractor
            .extract(&UploadedDocument::new(filename, bytes))
    }

    /// Number of entries currently in the scratch directory.
    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path())
            .expect("Failed to read scratch directory")
            .count()
    }
}
