use std::sync::Arc;

use crate::sanitize::sanitize_for_prompt;

use super::chunking::{chunk_words, word_count};
use super::client::{ChatMessage, ChatModel};
use super::error::LlmError;

const SYSTEM_PROMPT: &str = "You are a professional summarization assistant.";

/// Map-reduce summarization of long document text.
pub struct DocumentSummarizer {
    model: Arc<dyn ChatModel>,
    chunk_chars: usize,
    max_summary_words: usize,
    token_budget: u32,
}

impl DocumentSummarizer {
    pub fn new(
        model: Arc<dyn ChatModel>,
        chunk_chars: usize,
        max_summary_words: usize,
        token_budget: u32,
    ) -> Self {
        Self {
            model,
            chunk_chars,
            max_summary_words,
            token_budget,
        }
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "Summarize the following text in detail, extracting the most meaningful sections of the document. \
             Your summary should include: important information, key points, keywords, author names, \
             any mentioned names, specialized terminologies, dates, and numbers if present. \
             Present the summary clearly and keep it under {} tokens.\n\nText:\n{}",
            self.token_budget,
            sanitize_for_prompt(text)
        )
    }

    async fn summarize_once(&self, text: &str) -> Result<String, LlmError> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(self.prompt(text)),
        ];
        let reply = self.model.complete(&messages).await?;
        Ok(reply.trim().to_string())
    }

    /// Summarizes each chunk, then condenses the joined summaries once more if
    /// there was more than one chunk or the result is still too long.
    ///
    /// Text without words yields an empty summary and no LLM call.
    pub async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        let chunks = chunk_words(text, self.chunk_chars);
        if chunks.is_empty() {
            return Ok(String::new());
        }

        tracing::debug!(chunks = chunks.len(), "Summarizing document text");

        let mut summaries = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            tracing::debug!("Summarizing chunk {}/{}", idx + 1, chunks.len());
            summaries.push(self.summarize_once(chunk).await?);
        }

        let mut combined = summaries.join("\n");
        if summaries.len() > 1 || word_count(&combined) > self.max_summary_words {
            tracing::debug!("Condensing {} chunk summaries", summaries.len());
            combined = self.summarize_once(&combined).await?;
        }

        Ok(combined.trim().to_string())
    }
}
