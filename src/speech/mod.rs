pub mod http;

use async_trait::async_trait;
use log::info;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use self::http::HttpSpeechClient;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("no text provided for speech synthesis")]
    EmptyText,
    #[error("speech backend error: {0}")]
    Upstream(String),
}

/// Black-box text-to-speech: non-empty text in, MPEG audio bytes out.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

pub fn new_speech_client(
    args: &Args
) -> Result<Arc<dyn SpeechClient>, Box<dyn StdError + Send + Sync>> {
    info!(
        "Speech client configured: endpoint={}, model={}, voice={}",
        args.tts_base_url,
        args.tts_model,
        args.tts_voice
    );
    let client = HttpSpeechClient::new(
        args.tts_base_url.clone(),
        args.tts_api_key.clone(),
        args.tts_model.clone(),
        args.tts_voice.clone()
    )?;
    Ok(Arc::new(client))
}
