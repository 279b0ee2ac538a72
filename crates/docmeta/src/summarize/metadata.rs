use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::sanitize::{preview, sanitize_for_prompt};

use super::client::{ChatMessage, ChatModel};

const SYSTEM_PROMPT: &str = "You are a metadata extraction assistant.";

/// Returned in place of metadata when the LLM call itself fails.
pub const METADATA_FAILED: &str = "Metadata extraction failed.";

/// Structured description of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, deserialize_with = "list_or_comma_string")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "list_or_comma_string")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub author: Option<String>,
    #[serde(default, alias = "documentType", alias = "type")]
    pub document_type: String,
}

/// Accepts `["a", "b"]`, `"a, b"` or `null`.
fn list_or_comma_string<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<serde_json::Value>),
        Text(String),
    }

    let items = match Option::<ListOrString>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ListOrString::Text(text)) => text.split(',').map(str::to_string).collect(),
        Some(ListOrString::List(values)) => values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Accepts a string, a list of names (joined with ", ") or `null`.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = list_or_comma_string(deserializer)?;
    if names.is_empty() {
        Ok(None)
    } else {
        Ok(Some(names.join(", ")))
    }
}

/// What the metadata step produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataOutput {
    /// The reply contained a JSON object.
    Structured(DocumentMetadata),
    /// The reply had no parseable JSON; kept verbatim.
    Raw(String),
    /// The LLM call failed.
    Failed { error: String },
}

impl MetadataOutput {
    pub fn structured(&self) -> Option<&DocumentMetadata> {
        match self {
            Self::Structured(metadata) => Some(metadata),
            _ => None,
        }
    }
}

/// Returns the first balanced `{...}` block of `response`, if any.
///
/// Braces inside JSON strings (and escaped quotes) are ignored while scanning.
pub fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Interprets a metadata reply. Prose or code fences around the JSON are fine.
pub fn parse_metadata_reply(reply: &str) -> MetadataOutput {
    let parsed = extract_json(reply)
        .and_then(|json| serde_json::from_str::<DocumentMetadata>(json).ok());

    match parsed {
        Some(metadata) => MetadataOutput::Structured(metadata),
        None => {
            tracing::debug!(
                "Metadata reply is not JSON, keeping raw text: {}",
                preview(reply, 80)
            );
            MetadataOutput::Raw(reply.trim().to_string())
        }
    }
}

/// Builds the text the metadata prompt is run over.
///
/// With OCR text the two sources are labelled so the model can tell them apart.
pub fn metadata_input(document_text: &str, ocr_text: Option<&str>) -> String {
    match ocr_text.map(str::trim).filter(|t| !t.is_empty()) {
        None => document_text.trim().to_string(),
        Some(ocr) => format!(
            "The following document contains both extracted text and OCR text from images.\n\n\
             --- Extracted Text ---\n{}\n\n\
             --- OCR Extracted Text from Images ---\n{}",
            document_text.trim(),
            ocr
        ),
    }
}

pub struct MetadataGenerator {
    model: Arc<dyn ChatModel>,
}

impl MetadataGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn prompt(content: &str) -> String {
        format!(
            "You are a professional metadata assistant.\n\n\
             Analyze the following document content and return structured metadata in JSON format with fields:\n\
             - title\n\
             - summary (a detailed paragraph covering all important points)\n\
             - keywords (comma-separated)\n\
             - topics (broad subject categories)\n\
             - author (if mentioned)\n\
             - document_type (e.g., research paper, report, article)\n\n\
             Return only the JSON object.\n\n\
             Document Content:\n{}",
            sanitize_for_prompt(content)
        )
    }

    /// Asks the model for metadata about `content`.
    ///
    /// Never fails: an LLM error becomes [`MetadataOutput::Failed`].
    pub async fn generate(&self, content: &str) -> MetadataOutput {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::prompt(content)),
        ];

        match self.model.complete(&messages).await {
            Ok(reply) => parse_metadata_reply(&reply),
            Err(e) => {
                tracing::warn!("Metadata extraction failed: {}", e);
                MetadataOutput::Failed {
                    error: METADATA_FAILED.to_string(),
                }
            }
        }
    }
}
