use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::error::Error as StdError;
use std::time::Duration;

use super::{ SpeechClient, SpeechError };

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const SPEECH_ROUTE: &str = "/v1/audio/speech";

/// TTS backend speaking the OpenAI-compatible audio/speech wire format and
/// answering with a single MPEG audio payload.
pub struct HttpSpeechClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
    voice: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

impl HttpSpeechClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        voice: String
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            voice,
        })
    }

    fn speech_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), SPEECH_ROUTE)
    }
}

#[async_trait]
impl SpeechClient for HttpSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let req = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "mp3",
        };

        let mut request = self.http.post(self.speech_url()).json(&req);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send().await
            .map_err(|e| SpeechError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| SpeechError::Upstream(e.to_string()))?;

        let bytes = resp
            .bytes().await
            .map_err(|e| SpeechError::Upstream(e.to_string()))?;

        debug!("Synthesized {} bytes of audio", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpSpeechClient {
        HttpSpeechClient::new(
            "http://127.0.0.1:1".to_string(),
            None,
            "tts-1".to_string(),
            "alloy".to_string()
        ).unwrap()
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_any_call() {
        let err = client().synthesize("   ").await.unwrap_err();
        assert!(matches!(err, SpeechError::EmptyText));
    }

    #[tokio::test]
    async fn unreachable_backend_is_upstream_error() {
        let err = client().synthesize("hello").await.unwrap_err();
        assert!(matches!(err, SpeechError::Upstream(_)));
    }

    #[test]
    fn speech_url_joins_route() {
        assert_eq!(client().speech_url(), "http://127.0.0.1:1/v1/audio/speech");
    }
}
