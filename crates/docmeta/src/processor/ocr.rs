use std::sync::Arc;

use crate::error::ProcessError;
use crate::processor::image::RasterImage;

/// Recognizes printed text in a bitmap.
///
/// Implementations must be usable from several extraction calls at once.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &RasterImage) -> Result<String, ProcessError>;
}

/// Tesseract-backed OCR.
///
/// Without the `tesseract` cargo feature every call fails with
/// [`ProcessError::OcrFailed`], which the extractor turns into empty OCR text.
#[derive(Clone)]
pub struct TesseractOcr {
    inner: Arc<TesseractOcrInner>,
}

struct TesseractOcrInner {
    languages: String,
    dpi: u32,
}

impl TesseractOcr {
    pub fn new(languages: &[String], dpi: u32) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(TesseractOcrInner {
                languages: lang_str,
                dpi,
            }),
        }
    }

    pub fn languages(&self) -> &str {
        &self.inner.languages
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }
}

impl OcrEngine for TesseractOcr {
    #[cfg(feature = "tesseract")]
    fn recognize(&self, image: &RasterImage) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.ocr").entered();

        // leptess takes encoded images only.
        let png_data = image.to_png()?;

        // A fresh instance per call keeps the engine shareable across threads.
        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            ProcessError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;
        lt.set_source_resolution(self.inner.dpi as i32);

        lt.get_utf8_text()
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))
    }

    #[cfg(not(feature = "tesseract"))]
    fn recognize(&self, _image: &RasterImage) -> Result<String, ProcessError> {
        Err(ProcessError::OcrFailed(
            "Tesseract support not compiled in. Rebuild with --features tesseract".to_string(),
        ))
    }
}
