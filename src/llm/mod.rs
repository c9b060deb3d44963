pub mod chat;

/// Connection settings for the chat-completion backend. The API key is
/// optional by design: a missing key degrades generation to a fixed fallback
/// string instead of failing startup.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}
