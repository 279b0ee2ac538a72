use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use docmeta::{Config, DocumentFormat, ExtractionResult, ImageOrigin};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ExtractedImage<'a> {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub origin: &'a ImageOrigin,
    pub ocr_text: &'a str,
}

/// JSON shape of the `extract` command.
#[derive(Debug, Serialize)]
pub struct ExtractionView<'a> {
    pub filename: &'a str,
    pub format: Option<DocumentFormat>,
    pub primary_text: &'a str,
    pub ocr_text: &'a str,
    pub images: Vec<ExtractedImage<'a>>,
}

impl<'a> ExtractionView<'a> {
    pub fn new(filename: &'a str, extraction: &'a ExtractionResult) -> Self {
        let images = extraction
            .images_with_ocr()
            .enumerate()
            .map(|(i, (image, ocr_text))| ExtractedImage {
                index: i + 1,
                width: image.width(),
                height: image.height(),
                origin: image.origin(),
                ocr_text,
            })
            .collect();

        Self {
            filename,
            format: extraction.format(),
            primary_text: extraction.primary_text(),
            ocr_text: extraction.ocr_text(),
            images,
        }
    }
}

/// Pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => fs::write(path, json + "\n").map_err(|e| CliError::Write {
            path: path.to_path_buf(),
            source: e,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).map_err(|e| CliError::Write {
                path: PathBuf::from("<stdout>"),
                source: e,
            })
        }
    }
}

/// Saves every extracted image as `<stem>-image-<n>.png` (1-based) in `dir`.
pub fn write_images(
    dir: &Path,
    filename: &str,
    extraction: &ExtractionResult,
) -> Result<Vec<PathBuf>, CliError> {
    fs::create_dir_all(dir).map_err(|e| CliError::Write {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");

    let mut written = Vec::with_capacity(extraction.images().len());
    for (i, image) in extraction.images().iter().enumerate() {
        let path = dir.join(format!("{}-image-{}.png", stem, i + 1));
        let png = image.to_png()?;
        fs::write(&path, png).map_err(|e| CliError::Write {
            path: path.clone(),
            source: e,
        })?;
        written.push(path);
    }

    Ok(written)
}

/// The config as JSON, with any inline API key masked.
pub fn redacted_config(config: &Config) -> Config {
    let mut config = config.clone();
    if config.llm.api_key.is_some() {
        config.llm.api_key = Some("<redacted>".to_string());
    }
    config
}
