//! HTTP surface: chat, caption transcripts and a liveness probe.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chat_memory::SessionStore;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    chat::preview,
    parser::extract_video_id,
    yt::{CaptionFetcher, ProviderError},
    ChatError, ChatRequest, ChatService, TextGenerator,
};

pub struct AppState<S, G, C>
where
    S: SessionStore + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    pub chat: Arc<ChatService<S, G>>,
    pub captions: Arc<C>,
}

impl<S, G, C> AppState<S, G, C>
where
    S: SessionStore + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    pub fn new(chat: ChatService<S, G>, captions: C) -> Self {
        Self {
            chat: Arc::new(chat),
            captions: Arc::new(captions),
        }
    }
}

impl<S, G, C> Clone for AppState<S, G, C>
where
    S: SessionStore + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            chat: Arc::clone(&self.chat),
            captions: Arc::clone(&self.captions),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Content-Type must be application/json")]
    UnsupportedContentType,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("Missing videoId")]
    MissingVideoId,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedContentType,
            other => ApiError::InvalidBody(other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnsupportedContentType
            | ApiError::InvalidBody(_)
            | ApiError::MissingVideoId
            | ApiError::Chat(ChatError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Chat(ChatError::Generation { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Provider(ProviderError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = if status.is_server_error() {
            serde_json::json!({
                "error": self.to_string(),
                "message": "Please check server logs for details"
            })
        } else {
            serde_json::json!({ "error": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    pub prompt: Option<String>,
    #[serde(rename = "activeVideoUrl")]
    pub active_video_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptReply {
    pub transcript: String,
}

/// Build the application router.
pub fn build_router<S, G, C>(state: AppState<S, G, C>, cors: CorsLayer) -> Router
where
    S: SessionStore + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
    C: CaptionFetcher + Send + Sync + 'static,
{
    Router::new()
        .route("/chat", post(chat::<S, G, C>))
        .route("/ping", get(ping))
        .route("/transcribe", get(transcribe::<S, G, C>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the given origins; none means any origin.
pub fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Serves until `shutdown` is cancelled, letting in-flight requests finish.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!(addr = ?listener.local_addr()?, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

#[tracing::instrument(skip_all)]
async fn chat<S, G, C>(
    State(state): State<AppState<S, G, C>>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError>
where
    S: SessionStore + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
    C: CaptionFetcher + Send + Sync + 'static,
{
    let Json(payload) = payload
        .inspect_err(|e| tracing::warn!(error = %e, "Rejected chat request body"))?;

    let prompt = payload.prompt.ok_or_else(|| {
        tracing::warn!("Missing prompt in request");
        ChatError::Validation("Prompt not provided")
    })?;

    tracing::info!(
        active_video_url = %payload.active_video_url.as_deref().map(|u| preview(u, 50)).unwrap_or_else(|| "None".into()),
        "Received chat request"
    );

    let request = ChatRequest {
        prompt,
        active_resource_id: payload.active_video_url,
    };
    let response = state.chat.chat(request).await?;

    Ok(Json(ChatReply { response }))
}

async fn ping() -> &'static str {
    "Server is alive!"
}

#[tracing::instrument(skip_all)]
async fn transcribe<S, G, C>(
    State(state): State<AppState<S, G, C>>,
    Query(query): Query<TranscribeQuery>,
) -> Result<Json<TranscriptReply>, ApiError>
where
    S: SessionStore + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
    C: CaptionFetcher + Send + Sync + 'static,
{
    let video_id = query
        .video_id
        .as_deref()
        .and_then(extract_video_id)
        .ok_or(ApiError::MissingVideoId)?;

    tracing::info!(%video_id, "Transcribing video");
    let snippets = state
        .captions
        .fetch(&video_id)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Transcript error"))?;

    let transcript = snippets.iter().map(|s| s.text.as_str()).join("\n");

    Ok(Json(TranscriptReply { transcript }))
}
