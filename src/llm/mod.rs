// Language model module
// Prompt templating and the hosted chat completion client

pub mod groq;
pub mod prompt;

pub use groq::GroqClient;
pub use prompt::{PromptTemplate, anime_prompt};

use crate::Result;

/// A text-in, text-out language model
pub trait ChatModel: Send + Sync {
    /// Send `prompt` as a single user message and return the completion text
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}
