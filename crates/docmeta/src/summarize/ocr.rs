use std::sync::Arc;

use moka::sync::Cache;

use crate::sanitize::sanitize_for_prompt;

use super::client::{ChatMessage, ChatModel};

/// Reply for OCR text that is empty after trimming. No LLM call is made.
pub const NO_OCR_CONTENT: &str = "No OCR content found to summarize.";

const SYSTEM_PROMPT: &str = "You summarize OCR-extracted content in structured markdown.";

fn prompt(text: &str) -> String {
    format!(
        "You are a professional assistant. Start your response with 'The following image ...'. \
         Summarize the following OCR-extracted content in a clear, well-organized, and visually \
         appealing markdown format. Your summary should include:\n\
         - A short title or heading for the content\n\
         - Key points or highlights as a bullet list\n\
         - Detected names, dates, numbers, or keywords (if any)\n\
         - A concise paragraph summarizing the main idea or purpose\n\
         If the content is a graph or chart, explain axes and key trends. If it's a table, \
         highlight main comparisons or figures. If it's a scanned paragraph, summarize the main \
         idea. Avoid assumptions. If content is unclear, mention it.\n\n\
         OCR Text:\n{}",
        sanitize_for_prompt(text)
    )
}

/// Markdown summaries of OCR text, cached by the trimmed text.
pub struct OcrSummarizer {
    model: Arc<dyn ChatModel>,
    cache: Cache<String, String>,
}

impl OcrSummarizer {
    pub fn new(model: Arc<dyn ChatModel>, cache_capacity: u64) -> Self {
        Self {
            model,
            cache: Cache::new(cache_capacity),
        }
    }

    /// Summarizes `text`. Failures are reported in the returned string and
    /// are not cached, so the same text is retried on the next call.
    pub async fn summarize(&self, text: &str) -> String {
        let key = text.trim();
        if key.is_empty() {
            return NO_OCR_CONTENT.to_string();
        }

        if let Some(cached) = self.cache.get(key) {
            tracing::debug!("OCR summary cache hit ({} chars)", key.len());
            return cached;
        }

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt(key)),
        ];

        match self.model.complete(&messages).await {
            Ok(reply) => {
                let summary = reply.trim().to_string();
                self.cache.insert(key.to_string(), summary.clone());
                summary
            }
            Err(e) => {
                tracing::warn!("OCR summarization failed: {}", e);
                format!("OCR summarization failed: {}", e)
            }
        }
    }
}
