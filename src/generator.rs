//! Reply generation: persona prompt plus conversation text, one backend call.

use std::future::Future;

use log::debug;

use crate::error::Result;
use crate::openrouter::Message;
use crate::types::MessageRole;

/// Persona used when `SYSTEM_PROMPT` is not set. The fallback wording for
/// unanswerable text lives here, not in code.
pub const DEFAULT_PERSONA: &str = "\
You are a smart mad scientist from silicon valley.
Your goal is to give a concise prediction about a piece of text from the user.

- Include specific examples of old tech if they are relevant
- Respond in under 200 characters
- Your prediction should be given in an active voice and be opinionated
- If you don't have an answer, say, \"Sorry, my magic 8 ball isn't working right now 🔮\"
- Your response should be a prediction
- Your tone should be serious sarcastic
- Respond in one short sentence

The user will give you a piece of text to respond to";

/// A chat-completion backend: messages in, text out.
pub trait TextBackend {
    fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> impl Future<Output = Result<String>> + Send;
}

pub struct ReplyGenerator<B> {
    backend: B,
    persona: String,
    temperature: f32,
}

impl<B: TextBackend + Sync> ReplyGenerator<B> {
    pub fn new(backend: B, persona: impl Into<String>, temperature: f32) -> Self {
        Self {
            backend,
            persona: persona.into(),
            temperature,
        }
    }

    /// Generate a reply to `conversation_text`. The backend output is
    /// returned verbatim.
    ///
    /// # Errors
    ///
    /// Propagates any backend failure.
    pub async fn generate(&self, conversation_text: &str) -> Result<String> {
        let messages = [
            Message::new(MessageRole::System, self.persona.as_str()),
            Message::new(MessageRole::User, conversation_text),
        ];
        debug!(
            "Generating reply for {} characters of conversation text",
            conversation_text.chars().count()
        );
        self.backend.complete(&messages, self.temperature).await
    }
}
