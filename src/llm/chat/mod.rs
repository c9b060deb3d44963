pub mod groq;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use super::LlmConfig;
use crate::models::chat::ChatTurn;
use self::groq::GroqChatClient;

/// Shown when no API key is configured; generation is skipped entirely.
pub const MISSING_KEY_FALLBACK: &str = "I couldn't reach the AI service. Please set GROQ_API_KEY.";

/// Shown when the backend call itself fails in any way.
pub const GENERATION_FALLBACK: &str = "Sorry, I couldn't generate a response.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured for the generation backend")]
    MissingCredentials,
    #[error("generation backend error: {0}")]
    Upstream(String),
    #[error("generation backend returned no choices")]
    EmptyResponse,
}

/// Renders the user-visible text for a failed generation. Generation failure
/// never breaks the request; the error is logged and the caller receives one
/// of two fixed strings.
pub fn render_fallback(err: &GenerationError) -> String {
    match err {
        GenerationError::MissingCredentials => MISSING_KEY_FALLBACK.to_string(),
        _ => GENERATION_FALLBACK.to_string(),
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, GenerationError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = GroqChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
