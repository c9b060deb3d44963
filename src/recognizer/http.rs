use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::error::Error as StdError;
use std::time::Duration;

use super::{ RecognizeError, Recognizer };

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Recognizer backed by a remote inference endpoint. The endpoint accepts raw
/// image bytes and answers with one score per vocabulary class; the label is
/// the argmax over the vocabulary loaded at startup.
pub struct HttpRecognizer {
    http: HttpClient,
    endpoint: String,
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct PredictResponse {
    scores: Vec<f32>,
}

impl HttpRecognizer {
    pub fn new(
        endpoint: String,
        labels: Vec<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;
        Ok(Self { http, endpoint, labels })
    }

    fn argmax_label(&self, scores: &[f32]) -> Result<String, RecognizeError> {
        if scores.len() != self.labels.len() {
            return Err(RecognizeError::VocabularyMismatch {
                scores: scores.len(),
                labels: self.labels.len(),
            });
        }
        let mut best = 0usize;
        for (i, s) in scores.iter().enumerate() {
            if *s > scores[best] {
                best = i;
            }
        }
        Ok(self.labels[best].clone())
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, RecognizeError> {
        let resp = self.http
            .post(&self.endpoint)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send().await
            .map_err(|e| RecognizeError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| RecognizeError::Upstream(e.to_string()))?
            .json::<PredictResponse>().await
            .map_err(|e| RecognizeError::Upstream(format!("malformed response: {}", e)))?;

        let label = self.argmax_label(&resp.scores)?;
        debug!("Recognized label: {}", label);
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer(labels: &[&str]) -> HttpRecognizer {
        HttpRecognizer::new(
            "http://127.0.0.1:1/predict".to_string(),
            labels.iter().map(|s| s.to_string()).collect()
        ).unwrap()
    }

    #[test]
    fn argmax_picks_highest_score() {
        let r = recognizer(&["cat", "dog", "fish"]);
        assert_eq!(r.argmax_label(&[0.1, 0.7, 0.2]).unwrap(), "dog");
    }

    #[test]
    fn argmax_ties_go_to_first() {
        let r = recognizer(&["cat", "dog"]);
        assert_eq!(r.argmax_label(&[0.5, 0.5]).unwrap(), "cat");
    }

    #[test]
    fn argmax_rejects_length_mismatch() {
        let r = recognizer(&["cat", "dog"]);
        let err = r.argmax_label(&[0.5]).unwrap_err();
        assert!(matches!(err, RecognizeError::VocabularyMismatch { scores: 1, labels: 2 }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_upstream_error() {
        let r = recognizer(&["cat"]);
        let err = r.recognize(b"bytes").await.unwrap_err();
        assert!(matches!(err, RecognizeError::Upstream(_)));
    }
}
