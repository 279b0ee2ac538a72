use std::fmt;

use crate::processor::DocumentFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    Materializing,
    Extracting,
    Recognizing,
}

impl fmt::Display for ExtractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Materializing => "materializing",
            Self::Extracting => "extracting",
            Self::Recognizing => "recognizing",
        };
        f.write_str(name)
    }
}

/// Events emitted by the extractor while it works on one document.
/// Recognized text is omitted (can be large).
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Phase {
        phase: ExtractionPhase,
        message: String,
    },
    ImageRecognized {
        /// 1-based.
        index: usize,
        total: usize,
        chars: usize,
    },
    Completed {
        format: Option<DocumentFormat>,
        images: usize,
        text_chars: usize,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for library callers that do not track progress.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Forwards events to the tracing subscriber.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                tracing::info!(%phase, "{}", message);
            }
            ProgressEvent::ImageRecognized {
                index,
                total,
                chars,
            } => {
                tracing::info!("OCR image {}/{}: {} characters", index, total, chars);
            }
            ProgressEvent::Completed {
                format,
                images,
                text_chars,
            } => {
                tracing::info!(
                    format = ?format,
                    images,
                    text_chars,
                    "Extraction complete"
                );
            }
            ProgressEvent::Failed { error } => {
                tracing::error!("Extraction failed: {}", error);
            }
        }
    }
}
