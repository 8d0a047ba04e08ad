//! Voice API endpoints for the upload → reply interaction

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use serde::Serialize;

use super::ApiState;
use crate::Error;
use crate::assistant::Interaction;
use crate::session::{SessionHandle, Turn};
use crate::voice::AudioUpload;

/// Header carrying the caller's session ID
pub const SESSION_HEADER: &str = "x-session-id";

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/session", post(create_session).delete(end_session))
        .route("/interact", post(interact))
        .route("/history", get(history))
        .with_state(state)
}

/// Session creation response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// Start a new conversation session
async fn create_session(
    State(state): State<Arc<ApiState>>,
) -> (StatusCode, Json<SessionResponse>) {
    let (session_id, _) = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

/// End a session, discarding its history
async fn end_session(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<StatusCode, VoiceError> {
    let id = session_id(&headers).ok_or_else(missing_session_header)?;

    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(VoiceError::SessionNotFound)
    }
}

/// Synthesized reply audio, base64-encoded
#[derive(Debug, Serialize)]
pub struct AudioPayload {
    pub mime: &'static str,
    pub data: String,
}

/// Interaction response
#[derive(Debug, Serialize)]
pub struct InteractResponse {
    pub session_id: String,
    pub transcript: String,
    pub reply: String,
    pub reply_placeholder: bool,
    pub audio: Option<AudioPayload>,
    pub warning: Option<String>,
}

impl InteractResponse {
    fn new(session_id: String, interaction: Interaction) -> Self {
        let audio = interaction.audio.map(|a| AudioPayload {
            mime: a.mime,
            data: base64::engine::general_purpose::STANDARD.encode(a.data),
        });

        Self {
            session_id,
            transcript: interaction.transcript,
            reply: interaction.reply.content,
            reply_placeholder: interaction.reply.placeholder,
            audio,
            warning: interaction.warning,
        }
    }
}

/// Process an uploaded audio clip
///
/// Expects a multipart body with a `file` field (WAV or MP3). Without an
/// `x-session-id` header a new session is started; it is discarded again if
/// the interaction fails, since its ID never reaches the caller.
async fn interact(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<InteractResponse>, VoiceError> {
    let upload = read_upload(multipart).await?;
    let (session_id, handle, created) = resolve_session(&state, &headers).await?;

    let result = {
        let mut session = handle.lock().await;
        state.assistant.interact(&mut session, &upload).await
    };

    match result {
        Ok(interaction) => Ok(Json(InteractResponse::new(session_id, interaction))),
        Err(e) => {
            if created {
                state.sessions.remove(&session_id).await;
                tracing::debug!(session_id = %session_id, "discarded unreported session");
            }
            Err(e.into())
        }
    }
}

/// History response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

/// Return the session's conversation so far
async fn history(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, VoiceError> {
    let id = session_id(&headers).ok_or_else(missing_session_header)?;
    let handle = state
        .sessions
        .get(id)
        .await
        .ok_or(VoiceError::SessionNotFound)?;

    let session = handle.lock().await;
    Ok(Json(HistoryResponse {
        session_id: id.to_string(),
        turns: session.history().snapshot().to_vec(),
    }))
}

fn missing_session_header() -> VoiceError {
    VoiceError::BadRequest(format!("missing {SESSION_HEADER} header"))
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Look up the caller's session, or start one; the flag is set for new sessions
async fn resolve_session(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<(String, SessionHandle, bool), VoiceError> {
    match session_id(headers) {
        Some(id) => {
            let handle = state
                .sessions
                .get(id)
                .await
                .ok_or(VoiceError::SessionNotFound)?;
            Ok((id.to_string(), handle, false))
        }
        None => {
            let (id, handle) = state.sessions.create().await;
            Ok((id, handle, true))
        }
    }
}

/// Pull the `file` field out of a multipart body
async fn read_upload(mut multipart: Multipart) -> Result<AudioUpload, VoiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| VoiceError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| VoiceError::BadRequest(e.to_string()))?;

        return Ok(AudioUpload::new(
            &file_name,
            content_type.as_deref(),
            data.to_vec(),
        )?);
    }

    Err(VoiceError::BadRequest("missing 'file' field".to_string()))
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    BadRequest(String),
    SessionNotFound,
    TranscriptionFailed(String),
    ChatFailed(String),
    Internal(String),
}

impl From<Error> for VoiceError {
    fn from(e: Error) -> Self {
        match e {
            Error::Upload(msg) => Self::BadRequest(msg),
            Error::Transcription(msg) => Self::TranscriptionFailed(msg),
            Error::Chat(msg) => Self::ChatFailed(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "session_not_found",
                "session not found".to_string(),
            ),
            Self::TranscriptionFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "transcription_failed", msg)
            }
            Self::ChatFailed(msg) => (StatusCode::BAD_GATEWAY, "chat_failed", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
