use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::secrets::SecretSource;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub summarization: SummarizationConfig,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            ocr: OcrConfig::default(),
            extraction: ExtractionConfig::default(),
            llm: LlmConfig::default(),
            summarization: SummarizationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_dpi() -> u32 {
    300
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: default_languages(),
            dpi: default_dpi(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Where uploads are materialized. Defaults to the OS temp directory.
    #[serde(default)]
    pub temp_directory: Option<String>,
}

impl ExtractionConfig {
    pub fn temp_directory(&self) -> PathBuf {
        match self.temp_directory.as_deref() {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("GROQ_API_KEY".to_string())
}

fn default_max_tokens() -> u32 {
    700
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_file: None,
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn api_key_source(&self) -> SecretSource<'_> {
        SecretSource {
            value: self.api_key.as_deref(),
            file: self.api_key_file.as_deref(),
            env_var: self.api_key_env.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationConfig {
    /// A chunk closes once its words (plus one separator each) reach this many characters.
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    /// Joined chunk summaries longer than this many words are summarized again.
    #[serde(default = "default_max_summary_words")]
    pub max_summary_words: usize,
    #[serde(default = "default_true")]
    pub summarize_before_metadata: bool,
    /// Feed OCR text to the metadata prompt alongside the document text.
    #[serde(default)]
    pub include_ocr_text: bool,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_chunk_chars() -> usize {
    2800
}

fn default_max_summary_words() -> usize {
    700
}

fn default_cache_capacity() -> u64 {
    256
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            max_summary_words: default_max_summary_words(),
            summarize_before_metadata: true,
            include_ocr_text: false,
            cache_capacity: default_cache_capacity(),
        }
    }
}
