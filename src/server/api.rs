use std::sync::Arc;

use axum::{
    extract::{ Multipart, State },
    http::{ header, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Form,
    Json,
    Router,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{ debug, error };
use serde::{ Deserialize, Serialize };
use serde_json::Value;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{ Any, CorsLayer };

use crate::agent::{ Analysis, PipelineError, TutorAgent };
use crate::history::{ parse_history, parse_history_value, HistoryStore };
use crate::models::chat::ChatTurn;
use crate::vision::VisualFacts;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<TutorAgent>,
    pub history: Arc<dyn HistoryStore>,
}

#[derive(Serialize)]
struct IndexResponse {
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    object_label: String,
    visual_facts: VisualFacts,
    ai_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<String>,
}

#[derive(Deserialize)]
struct Base64Request {
    image_base64: String,
    #[serde(default)]
    question: String,
    #[serde(default)]
    history: Value,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct SpeechForm {
    text: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/analyze_image", post(analyze_image_handler))
        .route("/chat_about_image", post(chat_about_image_handler))
        .route("/analyze_image_base64", post(analyze_image_base64_handler))
        .route("/get_speech", post(get_speech_handler))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> impl IntoResponse {
    Json(IndexResponse {
        message: "Image tutor relay is running.".to_string(),
    })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// Decode and recognition failures both count as processing failures and
/// surface as structured 500s, never as raw stack traces.
fn pipeline_error_response(err: PipelineError) -> Response {
    error!("Pipeline failed: {}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Everything a handler can pull out of a multipart upload. The image is
/// accepted under `file`, with `image` as a legacy fallback field name; both
/// surfaces are kept deliberately.
#[derive(Default)]
struct UploadInput {
    file: Option<Vec<u8>>,
    question: String,
    history_raw: Option<String>,
    session_id: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> UploadInput {
    let mut input = UploadInput::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                if let Ok(bytes) = field.bytes().await {
                    input.file = Some(bytes.to_vec());
                }
            }
            "image" => {
                if input.file.is_none() {
                    if let Ok(bytes) = field.bytes().await {
                        input.file = Some(bytes.to_vec());
                    }
                }
            }
            "question" => {
                if let Ok(text) = field.text().await {
                    input.question = text;
                }
            }
            "history" => {
                if let Ok(text) = field.text().await {
                    input.history_raw = Some(text);
                }
            }
            "session_id" => {
                if let Ok(text) = field.text().await {
                    input.session_id = Some(text).filter(|s| !s.trim().is_empty());
                }
            }
            other => {
                debug!("Ignoring unknown multipart field '{}'", other);
            }
        }
    }
    input
}

/// Shared handler core: resolve the effective history, run the pipeline, and
/// record the exchange when a session is in play. Generation failures never
/// reach this layer; they arrive pre-rendered as fallback text.
async fn run_analysis(
    state: &AppState,
    image: &[u8],
    question: &str,
    explicit_history: Vec<ChatTurn>,
    session_id: Option<&str>
) -> Result<Analysis, Response> {
    let history = if !explicit_history.is_empty() {
        explicit_history
    } else if let Some(id) = session_id {
        state.history.recent(id).await
    } else {
        Vec::new()
    };

    let analysis = state.agent
        .analyze(image, question, &history).await
        .map_err(pipeline_error_response)?;

    if let Some(id) = session_id {
        let mut exchange = Vec::with_capacity(2);
        if !question.trim().is_empty() {
            exchange.push(ChatTurn::user(question));
        }
        exchange.push(ChatTurn::assistant(analysis.ai_response.clone()));
        state.history.append(id, &exchange).await;
    }

    Ok(analysis)
}

async fn analyze_image_handler(
    State(state): State<AppState>,
    multipart: Multipart
) -> Response {
    let input = read_upload(multipart).await;
    let Some(image) = input.file else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    match run_analysis(&state, &image, "", Vec::new(), None).await {
        Ok(analysis) =>
            Json(AnalyzeResponse {
                object_label: analysis.object_label,
                visual_facts: analysis.visual_facts,
                ai_response: analysis.ai_response,
                question: None,
            }).into_response(),
        Err(resp) => resp,
    }
}

async fn chat_about_image_handler(
    State(state): State<AppState>,
    multipart: Multipart
) -> Response {
    let input = read_upload(multipart).await;
    let Some(image) = input.file else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    let history = parse_history(input.history_raw.as_deref());
    match
        run_analysis(&state, &image, &input.question, history, input.session_id.as_deref()).await
    {
        Ok(analysis) =>
            Json(AnalyzeResponse {
                object_label: analysis.object_label,
                visual_facts: analysis.visual_facts,
                ai_response: analysis.ai_response,
                question: Some(input.question),
            }).into_response(),
        Err(resp) => resp,
    }
}

/// Strips an optional `data:image/...;base64,` prefix before decoding.
fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.find("base64,") {
        Some(idx) => &encoded[idx + "base64,".len()..],
        None => encoded,
    };
    BASE64.decode(payload.trim())
}

async fn analyze_image_base64_handler(
    State(state): State<AppState>,
    Json(req): Json<Base64Request>
) -> Response {
    let image = match decode_base64_image(&req.image_base64) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            return error_response(StatusCode::BAD_REQUEST, "No file provided");
        }
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid base64 image: {}", e));
        }
    };

    let history = parse_history_value(&req.history);
    match run_analysis(&state, &image, &req.question, history, req.session_id.as_deref()).await {
        Ok(analysis) =>
            Json(AnalyzeResponse {
                object_label: analysis.object_label,
                visual_facts: analysis.visual_facts,
                ai_response: analysis.ai_response,
                question: Some(req.question),
            }).into_response(),
        Err(resp) => resp,
    }
}

async fn get_speech_handler(
    State(state): State<AppState>,
    Form(form): Form<SpeechForm>
) -> Response {
    let text = form.text.unwrap_or_default();
    if text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No text provided");
    }

    match state.agent.speak(&text).await {
        Ok(audio) =>
            ([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response(),
        Err(e) => {
            error!("Speech synthesis failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
