use std::path::PathBuf;

use crate::config::Config;

pub struct PipelineConfig {
    pub temp_directory: PathBuf,
    pub ocr_enabled: bool,
    pub ocr_languages: Vec<String>,
    pub ocr_dpi: u32,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temp_directory: config.extraction.temp_directory(),
            ocr_enabled: config.ocr.enabled,
            ocr_languages: config.ocr.languages.clone(),
            ocr_dpi: config.ocr.dpi,
        }
    }
}
