pub mod http;

use async_trait::async_trait;
use log::info;
use std::error::Error as StdError;
use std::fs;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use self::http::HttpRecognizer;

#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("classifier request failed: {0}")]
    Upstream(String),
    #[error("classifier returned {scores} scores for a vocabulary of {labels} labels")]
    VocabularyMismatch { scores: usize, labels: usize },
}

/// Black-box label predictor: image bytes in, best-guess class name out.
/// Implementations always return a label for a successful call; there is no
/// confidence threshold.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, RecognizeError>;
}

/// Loads the fixed label vocabulary, one label per line. Called once at
/// startup; the vocabulary never changes for the process lifetime.
pub fn load_labels(path: &str) -> Result<Vec<String>, Box<dyn StdError + Send + Sync>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read labels file '{}': {}", path, e))?;
    let labels: Vec<String> = content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        return Err(format!("Labels file '{}' contains no labels", path).into());
    }
    Ok(labels)
}

pub fn new_recognizer(args: &Args) -> Result<Arc<dyn Recognizer>, Box<dyn StdError + Send + Sync>> {
    let labels = load_labels(&args.labels_path)?;
    info!(
        "Recognizer configured: endpoint={}, vocabulary={} labels",
        args.classifier_url,
        labels.len()
    );
    let recognizer = HttpRecognizer::new(args.classifier_url.clone(), labels)?;
    Ok(Arc::new(recognizer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_labels(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_labels_strips_blanks() {
        let path = temp_labels("image_tutor_labels_ok.txt", "goldfish\n\n  tabby cat  \nbanana\n");
        let labels = load_labels(path.to_str().unwrap()).unwrap();
        assert_eq!(labels, vec!["goldfish", "tabby cat", "banana"]);
    }

    #[test]
    fn load_labels_rejects_empty_file() {
        let path = temp_labels("image_tutor_labels_empty.txt", "\n\n");
        assert!(load_labels(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn load_labels_rejects_missing_file() {
        assert!(load_labels("/nonexistent/labels.txt").is_err());
    }
}
