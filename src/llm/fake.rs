//! Scripted completion client for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionClient, LlmError, Prompt, PromptKind};

/// Returns a canned reply per prompt kind and records every prompt it sees.
#[derive(Default)]
pub struct ScriptedClient {
    replies: HashMap<PromptKind, Result<String, LlmError>>,
    seen: Mutex<Vec<Prompt>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, kind: PromptKind, body: impl Into<String>) -> Self {
        self.replies.insert(kind, Ok(body.into()));
        self
    }

    pub fn fail(mut self, kind: PromptKind, error: LlmError) -> Self {
        self.replies.insert(kind, Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push(prompt.clone());
        self.replies
            .get(&prompt.kind)
            .cloned()
            .unwrap_or(Err(LlmError::NotConfigured))
    }
}
