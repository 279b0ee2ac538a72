//! Scripted chat model for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{ChatMessage, ChatModel};
use super::error::LlmError;

type Responder = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

/// Answers every call through `responder`, recording the user prompts it saw.
pub struct ScriptedModel {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(
        responder: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with `reply`.
    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Always fails with an HTTP 503.
    pub fn failing() -> Self {
        Self::new(|_| {
            Err(LlmError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            })
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt.clone());
        (self.responder)(&prompt)
    }
}
