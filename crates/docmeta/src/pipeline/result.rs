use crate::processor::{DocumentFormat, ExtractedContent, RasterImage};

/// The normalized output of one extraction.
///
/// `images` and `ocr_texts_per_image` always have the same length, entry `i`
/// of one belonging to entry `i` of the other. Document text and OCR text are
/// kept apart; combining them is up to the caller.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    format: Option<DocumentFormat>,
    primary_text: String,
    images: Vec<RasterImage>,
    ocr_texts_per_image: Vec<String>,
    ocr_text: String,
}

impl ExtractionResult {
    /// Combines handler output with one OCR string per image.
    ///
    /// Missing OCR entries become empty strings and surplus ones are dropped,
    /// so the alignment holds whatever the caller passes.
    pub(crate) fn assemble(
        format: DocumentFormat,
        content: ExtractedContent,
        mut ocr_texts: Vec<String>,
    ) -> Self {
        let ExtractedContent { text, images } = content;
        ocr_texts.resize(images.len(), String::new());

        let ocr_text = ocr_texts.join("\n").trim().to_string();

        Self {
            format: Some(format),
            primary_text: text.trim().to_string(),
            images,
            ocr_texts_per_image: ocr_texts,
            ocr_text,
        }
    }

    /// The result for a file whose suffix has no handler.
    ///
    /// `suffix` is the lower-cased, dotted extension (possibly empty).
    pub(crate) fn unsupported(suffix: &str) -> Self {
        Self {
            format: None,
            primary_text: format!("Unsupported file type: {}", suffix),
            images: Vec::new(),
            ocr_texts_per_image: Vec::new(),
            ocr_text: String::new(),
        }
    }

    /// `None` when the file type was not recognized.
    pub fn format(&self) -> Option<DocumentFormat> {
        self.format
    }

    pub fn primary_text(&self) -> &str {
        &self.primary_text
    }

    pub fn images(&self) -> &[RasterImage] {
        &self.images
    }

    pub fn ocr_texts_per_image(&self) -> &[String] {
        &self.ocr_texts_per_image
    }

    pub fn ocr_text(&self) -> &str {
        &self.ocr_text
    }

    pub fn is_unsupported(&self) -> bool {
        self.format.is_none()
    }

    /// True when there is document text or OCR text to work with.
    ///
    /// The unsupported sentinel never has content.
    pub fn has_content(&self) -> bool {
        !self.is_unsupported() && (!self.primary_text.is_empty() || !self.ocr_text.is_empty())
    }

    /// Iterates images together with their OCR text.
    pub fn images_with_ocr(&self) -> impl Iterator<Item = (&RasterImage, &str)> {
        self.images
            .iter()
            .zip(self.ocr_texts_per_image.iter().map(String::as_str))
    }
}
