use std::path::{Path, PathBuf};

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

const MIN_DPI: u32 = 70;
const MAX_DPI: u32 = 1200;

/// `<config dir>/docmeta/config.json`, e.g. `~/.config/docmeta/config.json` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docmeta").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads `explicit` if given, else the default location if it exists, else
/// built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!("Loading config from {}", path.display());
            load_config(path)
        }
        _ => {
            tracing::debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    // OCR
    if !(MIN_DPI..=MAX_DPI).contains(&config.ocr.dpi) {
        return Err(invalid(format!(
            "ocr.dpi must be between {} and {}, got {}",
            MIN_DPI, MAX_DPI, config.ocr.dpi
        )));
    }
    for lang in &config.ocr.languages {
        if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid(format!("Invalid OCR language code: '{}'", lang)));
        }
    }

    // LLM
    let llm = &config.llm;
    if !(llm.base_url.starts_with("https://") || llm.base_url.starts_with("http://")) {
        return Err(invalid(format!(
            "llm.base_url must be an http(s) URL, got '{}'",
            llm.base_url
        )));
    }
    if llm.model.trim().is_empty() {
        return Err(invalid("llm.model must not be empty"));
    }
    if llm.max_tokens == 0 {
        return Err(invalid("llm.max_tokens must be greater than 0"));
    }
    if let Some(temperature) = llm.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid(format!(
                "llm.temperature must be between 0 and 2, got {}",
                temperature
            )));
        }
    }
    if llm.timeout_secs == 0 || llm.connect_timeout_secs == 0 {
        return Err(invalid("llm timeouts must be greater than 0"));
    }

    // Summarization
    let summarization = &config.summarization;
    if summarization.chunk_chars == 0 {
        return Err(invalid("summarization.chunk_chars must be greater than 0"));
    }
    if summarization.max_summary_words == 0 {
        return Err(invalid(
            "summarization.max_summary_words must be greater than 0",
        ));
    }
    if summarization.cache_capacity == 0 {
        return Err(invalid(
            "summarization.cache_capacity must be greater than 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "ocr": {
                "enabled": false,
                "languages": ["eng", "deu"],
                "dpi": 200
            },
            "extraction": {
                "temp_directory": "/var/tmp"
            },
            "llm": {
                "model": "llama-3.1-8b-instant",
                "api_key_env": "MY_KEY",
                "max_tokens": 512,
                "temperature": 0.2
            },
            "summarization": {
                "chunk_chars": 1000,
                "include_ocr_text": true
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert!(!config.ocr.enabled);
        assert_eq!(config.ocr.languages, vec!["eng", "deu"]);
        assert_eq!(config.ocr.dpi, 200);
        assert_eq!(config.extraction.temp_directory.as_deref(), Some("/var/tmp"));
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.api_key_env.as_deref(), Some("MY_KEY"));
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.summarization.chunk_chars, 1000);
        assert_eq!(config.summarization.max_summary_words, 700);
        assert!(config.summarization.include_ocr_text);
    }

    #[test]
    fn test_minimal_config() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert!(config.ocr.enabled);
        assert_eq!(config.llm.max_tokens, 700);
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str(r#"{ "version": "1.0", "#);
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = load_config_from_str(r#"{ "summarization": { "chunk_chars": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_out_of_range_dpi_rejected() {
        for dpi in [10, 5000] {
            let json = format!(r#"{{ "ocr": {{ "dpi": {} }} }}"#, dpi);
            let result = load_config_from_str(&json);
            assert!(
                matches!(result, Err(ConfigError::Validation { .. })),
                "dpi {} should be rejected",
                dpi
            );
        }
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = load_config_from_str(r#"{ "llm": { "model": "  " } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_bad_language_code_rejected() {
        let result = load_config_from_str(r#"{ "ocr": { "languages": ["eng+deu"] } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let result = load_config_from_str(r#"{ "llm": { "base_url": "ftp://example.com" } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let result = load_config_from_str(r#"{ "llm": { "temperature": 3.5 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "version": "1.0", "ocr": {{ "dpi": 150 }} }}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ocr.dpi, 150);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_config("/nonexistent/docmeta/config.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_load_or_default_prefers_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "llm": {{ "model": "custom-model" }} }}"#).unwrap();

        let config = load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.llm.model, "custom-model");
    }

    #[test]
    fn test_defaults_pass_validation() {
        validate_config(&Config::default()).unwrap();
    }
}
