pub mod config;
pub mod error;
pub mod materialize;
pub mod progress;
pub mod result;
pub mod runner;
pub mod upload;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use materialize::MaterializedFile;
pub use progress::{ExtractionPhase, LogProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use result::ExtractionResult;
pub use runner::Extractor;
pub use upload::UploadedDocument;
