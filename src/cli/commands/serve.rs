//! HTTP API server for the web front end.
//!
//! Provides REST endpoints for upload, segment search and transcript chat.

use crate::chat::{ChatEngine, SessionStore};
use crate::cli::Output;
use crate::config::{Prompts, ServerSettings, Settings};
use crate::error::Result as ClipscoutResult;
use crate::ingest::Ingestor;
use crate::llm::OpenAICompleter;
use crate::orchestrator::SegmentFinder;
use crate::transcript::FileTranscriptStore;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Session used when a chat request carries no id.
const DEFAULT_SESSION: &str = "default";

const CHAT_APOLOGY: &str =
    "I apologize, but I'm having trouble processing your request right now. Please try again.";

/// Shared application state.
struct AppState {
    finder: SegmentFinder,
    chat: ChatEngine,
    sessions: SessionStore,
    ingestor: Ingestor,
    store: FileTranscriptStore,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let store = FileTranscriptStore::new(settings.transcript_dir());
    let chat = ChatEngine::new(
        Arc::new(store.clone()),
        Arc::new(OpenAICompleter::from_settings(&settings.llm)?),
    )
    .with_prompts(prompts);

    let state = Arc::new(AppState {
        finder: SegmentFinder::new(&settings)?,
        chat,
        sessions: SessionStore::with_capacity(settings.server.max_chat_sessions),
        ingestor: Ingestor::new(&settings)?,
        store,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/upload-video", post(upload_video))
        .route("/find-best-segments", post(find_best_segments))
        .route("/chat", post(chat_message))
        .route("/transcripts", get(list_transcripts))
        .layer(DefaultBodyLimit::max(settings.server.max_upload_mb * 1024 * 1024))
        .layer(cors_layer(&settings.server))
        .with_state(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Clipscout API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Upload", "POST /upload-video");
    Output::kv("Find", "POST /find-best-segments");
    Output::kv("Chat", "POST /chat");
    Output::kv("Transcripts", "GET  /transcripts");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS for the configured local front-end origins, with credentials.
fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    transcript_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    status: &'static str,
    response: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ChatResponse {
    fn from_result(message: String, result: ClipscoutResult<String>) -> Self {
        match result {
            Ok(response) => Self {
                status: "success",
                response,
                message,
                error: None,
            },
            Err(e) => Self {
                status: "error",
                response: CHAT_APOLOGY.to_string(),
                message,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn upload_video(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.mp4").to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };

        return match state.ingestor.ingest_upload(&filename, &data).await {
            Ok(result) => Json(result).into_response(),
            Err(e) => {
                warn!("Upload of {} failed: {}", filename, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
    }

    error_response(StatusCode::BAD_REQUEST, "Missing multipart field 'file'")
}

async fn find_best_segments(State(state): State<Arc<AppState>>, body: String) -> impl IntoResponse {
    Json(state.finder.find_best_segments(body.trim()).await)
}

async fn chat_message(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    let session_id = req.session_id.as_deref().unwrap_or(DEFAULT_SESSION);
    let session = state.sessions.session(session_id).await;
    let mut session = session.lock().await;

    let result = state
        .chat
        .ask(&mut session, &req.message, req.transcript_id.as_deref())
        .await;

    Json(ChatResponse::from_result(req.message, result))
}

async fn list_transcripts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let records = match state.store.list() {
        Ok(records) => records,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let active = state.store.active_id().ok().flatten();

    Json(serde_json::json!({
        "total": records.len(),
        "active": active,
        "transcripts": records,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClipscoutError;

    #[test]
    fn test_chat_response_success() {
        let response = ChatResponse::from_result("Hi".to_string(), Ok("Hello!".to_string()));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["response"], "Hello!");
        assert_eq!(json["message"], "Hi");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_chat_response_error_apologizes() {
        let response = ChatResponse::from_result(
            "Hi".to_string(),
            Err(ClipscoutError::LlmService("quota exceeded".to_string())),
        );

        assert_eq!(response.status, "error");
        assert_eq!(response.response, CHAT_APOLOGY);
        assert!(response.error.unwrap().contains("quota exceeded"));
    }

    #[test]
    fn test_chat_request_optional_fields() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "What is this about?"}"#).unwrap();
        assert_eq!(req.message, "What is this about?");
        assert!(req.session_id.is_none());
        assert!(req.transcript_id.is_none());
    }

    #[test]
    fn test_cors_skips_invalid_origins() {
        let server = ServerSettings {
            cors_port_start: 5173,
            cors_port_end: 5174,
            extra_origins: vec!["bad\norigin".to_string()],
            ..Default::default()
        };

        // Building the layer must not panic on a bad origin.
        let _layer = cors_layer(&server);
        assert_eq!(server.allowed_origins().len(), 3);
    }
}
