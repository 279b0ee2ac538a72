pub mod loader;
pub mod schema;

pub use loader::{default_config_path, load_config, load_config_from_str, load_or_default};
pub use schema::{Config, ExtractionConfig, LlmConfig, OcrConfig, SummarizationConfig};
