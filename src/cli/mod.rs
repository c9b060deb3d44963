use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8000")]
    pub server_addr: String,

    // --- Generation Backend Args ---
    /// API key for the Groq generation backend. When absent the service still
    /// starts; generation degrades to a fixed fallback string.
    #[arg(long, env = "GROQ_API_KEY")]
    pub groq_api_key: Option<String>,

    /// Model name for chat completion.
    #[arg(long, env = "CHAT_MODEL")] // No default, adapter supplies one
    pub chat_model: Option<String>,

    /// Base URL for the generation backend API.
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    // --- Classifier Args ---
    /// Endpoint of the external classification model (raw image bytes in,
    /// per-class scores out).
    #[arg(long, env = "CLASSIFIER_URL", default_value = "http://127.0.0.1:8501/predict")]
    pub classifier_url: String,

    /// Path to the classifier's label vocabulary, one label per line.
    /// Loaded once at startup.
    #[arg(long, env = "LABELS_PATH", default_value = "data/imagenet_labels.txt")]
    pub labels_path: String,

    /// Longest allowed image edge before recognition; larger uploads are
    /// downsampled.
    #[arg(long, env = "MAX_IMAGE_EDGE", default_value = "512")]
    pub max_image_edge: u32,

    // --- Speech Backend Args ---
    /// Base URL of the text-to-speech backend (OpenAI-compatible
    /// /v1/audio/speech).
    #[arg(long, env = "TTS_BASE_URL", default_value = "https://api.openai.com")]
    pub tts_base_url: String,

    /// API key for the text-to-speech backend.
    #[arg(long, env = "TTS_API_KEY")]
    pub tts_api_key: Option<String>,

    /// Voice model for speech synthesis.
    #[arg(long, env = "TTS_MODEL", default_value = "tts-1")]
    pub tts_model: String,

    /// Voice name for speech synthesis.
    #[arg(long, env = "TTS_VOICE", default_value = "alloy")]
    pub tts_voice: String,

    // --- Session History Args ---
    /// Maximum turns retained per session; older turns are dropped.
    #[arg(long, env = "HISTORY_MAX_TURNS", default_value = "32")]
    pub history_max_turns: usize,

    /// Maximum concurrently retained sessions; the least-recently-active one
    /// is evicted first.
    #[arg(long, env = "HISTORY_MAX_SESSIONS", default_value = "256")]
    pub history_max_sessions: usize,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format) for HTTPS.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for HTTPS.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
