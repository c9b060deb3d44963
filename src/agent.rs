use log::{ error, info };
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::llm::LlmConfig;
use crate::llm::chat::{ new_client as new_chat_client, render_fallback, ChatClient };
use crate::models::chat::ChatTurn;
use crate::prompt;
use crate::recognizer::{ new_recognizer, RecognizeError, Recognizer };
use crate::speech::{ new_speech_client, SpeechClient, SpeechError };
use crate::vision::{ self, VisionError, VisualFacts, FACT_DOMINANT_COLOR };

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error(transparent)]
    Recognition(#[from] RecognizeError),
}

/// Result of one trip through the analysis pipeline. `ai_response` is always
/// populated: either a genuine model answer, the direct color sentence, or a
/// fixed fallback string.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub object_label: String,
    pub visual_facts: VisualFacts,
    pub ai_response: String,
}

/// Orchestrates recognition, fact extraction, prompt composition, and
/// generation for one request. Holds no per-request state.
pub struct TutorAgent {
    recognizer: Arc<dyn Recognizer>,
    chat_client: Arc<dyn ChatClient>,
    speech_client: Arc<dyn SpeechClient>,
    max_edge: u32,
}

impl TutorAgent {
    pub fn new(args: &Args) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let recognizer = new_recognizer(args)?;

        let chat_config = LlmConfig {
            api_key: args.groq_api_key.clone().filter(|k| !k.trim().is_empty()),
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
        };
        if chat_config.api_key.is_none() {
            info!("GROQ_API_KEY not set; generation will degrade to a fixed fallback");
        }
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Model={}, BaseURL={:?}",
            chat_client.get_model(),
            chat_client.get_base_url()
        );

        let speech_client = new_speech_client(args)?;

        Ok(Self {
            recognizer,
            chat_client,
            speech_client,
            max_edge: args.max_image_edge,
        })
    }

    pub fn with_clients(
        recognizer: Arc<dyn Recognizer>,
        chat_client: Arc<dyn ChatClient>,
        speech_client: Arc<dyn SpeechClient>,
        max_edge: u32
    ) -> Self {
        Self { recognizer, chat_client, speech_client, max_edge }
    }

    /// Runs the full image-to-explanation pipeline: decode and bound the
    /// image, recognize, extract facts, then answer. Recognition and decode
    /// failures propagate; generation failures are rendered as fallback text.
    pub async fn analyze(
        &self,
        image: &[u8],
        question: &str,
        history: &[ChatTurn]
    ) -> Result<Analysis, PipelineError> {
        let decoded = vision::decode(image)?;
        let bounded = vision::bound_longest_edge(decoded, self.max_edge);

        // Re-encode after bounding so oversized uploads never reach the
        // classifier at full weight. Falls back to the original bytes if
        // encoding fails.
        let mut transport = Vec::new();
        {
            use std::io::Cursor;
            use image::{ DynamicImage, ImageFormat };
            if DynamicImage::ImageRgb8(bounded)
                .write_to(&mut Cursor::new(&mut transport), ImageFormat::Jpeg)
                .is_err()
            {
                transport = image.to_vec();
            }
        }

        let object_label = self.recognizer.recognize(&transport).await?;
        let visual_facts = vision::extract_facts(image);

        let ai_response = if let Some(direct) = color_question_answer(question, &visual_facts) {
            direct
        } else {
            let messages = prompt::compose(&object_label, &visual_facts, question, history);
            match self.chat_client.complete(&messages).await {
                Ok(answer) => answer,
                Err(e) => {
                    error!("Generation failed, serving fallback: {}", e);
                    render_fallback(&e)
                }
            }
        };

        Ok(Analysis { object_label, visual_facts, ai_response })
    }

    pub async fn speak(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        self.speech_client.synthesize(text).await
    }
}

/// Direct answer for color questions: when the question mentions "color" in
/// any case, the extracted dominant-color fact answers it without invoking
/// the generation backend at all.
pub fn color_question_answer(question: &str, facts: &VisualFacts) -> Option<String> {
    if !question.to_lowercase().contains("color") {
        return None;
    }
    match facts.get(FACT_DOMINANT_COLOR).filter(|v| !v.is_empty()) {
        Some(color) => Some(format!("The main color I see is {}.", color)),
        None => Some("I couldn't tell the main color of this image.".to_string()),
    }
}
