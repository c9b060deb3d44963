use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::time::Duration;

use super::{ ChatClient, GenerationError };
use crate::llm::LlmConfig;
use crate::models::chat::ChatTurn;

const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const COMPLETIONS_ROUTE: &str = "/openai/v1/chat/completions";

/// Sampling parameters are fixed: low temperature keeps answers factual for
/// the tutoring persona, and the token cap bounds response latency.
const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 512;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

pub struct GroqChatClient {
    http: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Deserialize)]
struct GroqMessage {
    content: String,
}

impl GroqChatClient {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Self::new(
            config.api_key.clone(),
            config.completion_model.clone(),
            config.base_url.clone()
        )
    }

    fn completions_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), COMPLETIONS_ROUTE)
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, GenerationError> {
        // No key means no call at all.
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingCredentials)?;

        let req = GroqRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!("Sending {} messages to {}", messages.len(), self.completions_url());

        let resp = self.http
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&req)
            .send().await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| GenerationError::Upstream(e.to_string()))?
            .json::<GroqResponse>().await
            .map_err(|e| GenerationError::Upstream(format!("malformed response: {}", e)))?;

        let content = resp.choices
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyResponse)?
            .message.content;

        Ok(content.trim().to_string())
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_short_circuits_before_any_call() {
        let client = GroqChatClient::new(None, None, None).unwrap();
        let err = client.complete(&[ChatTurn::user("hi")]).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredentials));
    }

    #[tokio::test]
    async fn blank_key_counts_as_missing() {
        let client = GroqChatClient::new(Some("   ".to_string()), None, None).unwrap();
        let err = client.complete(&[ChatTurn::user("hi")]).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredentials));
    }

    #[test]
    fn defaults_apply_when_unconfigured() {
        let client = GroqChatClient::new(Some("key".to_string()), None, None).unwrap();
        assert_eq!(client.get_model(), DEFAULT_MODEL);
        assert_eq!(
            client.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_tolerated() {
        let client = GroqChatClient::new(
            Some("key".to_string()),
            Some("my-model".to_string()),
            Some("http://localhost:9999/".to_string())
        ).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:9999/openai/v1/chat/completions");
    }
}
