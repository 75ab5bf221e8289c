use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::modules::chat::schema::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, ResetResponse,
};
use crate::services::conversation::{ChatError, ConversationManager};
use crate::services::llm::{LlmError, LlmErrorKind};
use crate::AppState;

const SESSION_COOKIE: &str = "chat_session";

// User-facing copy for each failure category. The server log keeps the real
// error text; clients only ever see these.
pub const MSG_SERVICE_UNAVAILABLE: &str =
    "The assistant is not configured yet. Please try again later.";
pub const MSG_RATE_LIMITED: &str =
    "The assistant is handling too many requests right now. Please wait a moment and try again.";
pub const MSG_AUTH_FAILED: &str =
    "The assistant service rejected our credentials. Please contact the site administrator.";
pub const MSG_TIMED_OUT: &str = "The assistant took too long to reply. Please try again.";
pub const MSG_EMPTY_REPLY: &str = "The assistant returned an empty reply. Please try again.";
pub const MSG_GENERIC: &str =
    "Sorry, something went wrong while generating a reply. Please try again.";

fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn session_cookie(session_id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id)
}

fn chat_error_response(e: &ChatError) -> (StatusCode, Json<ErrorResponse>) {
    let message = match e {
        ChatError::EmptyResponse => MSG_EMPTY_REPLY,
        ChatError::Remote(remote) => match remote {
            LlmError::Api { kind, .. } => match kind {
                LlmErrorKind::RateLimited => MSG_RATE_LIMITED,
                LlmErrorKind::AuthFailed => MSG_AUTH_FAILED,
                LlmErrorKind::TimedOut => MSG_TIMED_OUT,
                LlmErrorKind::Other => MSG_GENERIC,
            },
            LlmError::MissingApiKey | LlmError::InvalidResponse(_) => MSG_GENERIC,
        },
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message)),
    )
}

/// Serves the chat page. Revisiting the entry page starts a fresh
/// conversation, so any stored history for the caller is cleared here.
pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let session_id =
        session_from_headers(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Err(e) = state.store.clear(&session_id).await {
        warn!("failed to clear history on page load: {}", e);
    }

    (
        [(header::SET_COOKIE, session_cookie(&session_id))],
        Html(include_str!("../../../static/index.html")),
    )
}

pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = payload.validate() {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))));
    }

    let message = payload.message.as_deref().unwrap_or("");
    if message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Message cannot be empty")),
        ));
    }

    // Checked before touching the session so a misconfigured deployment
    // fails fast with a stable message.
    let llm = state.llm.clone().ok_or_else(|| {
        error!("chat request received but no completion client is configured");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(MSG_SERVICE_UNAVAILABLE)),
        )
    })?;

    let session_id =
        session_from_headers(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());

    // A load failure degrades to a fresh conversation rather than a 500.
    let mut history = match state.store.load(&session_id).await {
        Ok(history) => history,
        Err(e) => {
            error!("failed to load history for session {}: {}", session_id, e);
            Vec::new()
        }
    };

    let manager = ConversationManager::new(llm);
    let reply = manager.submit(&mut history, message).await.map_err(|e| {
        error!("chat exchange failed for session {}: {}", session_id, e);
        chat_error_response(&e)
    })?;

    if let Err(e) = state.store.save(&session_id, &history).await {
        // The reply already exists; losing continuity beats losing the reply.
        error!("failed to save history for session {}: {}", session_id, e);
    }

    info!(
        "completed exchange for session {} ({} turns retained)",
        session_id,
        history.len()
    );

    Ok((
        [(header::SET_COOKIE, session_cookie(&session_id))],
        Json(ChatResponse::success(reply)),
    ))
}

pub async fn reset(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<ResetResponse>) {
    // No cookie means no stored history; resetting nothing still succeeds.
    let Some(session_id) = session_from_headers(&headers) else {
        return (
            StatusCode::OK,
            Json(ResetResponse {
                status: "success".to_string(),
                message: "Conversation reset".to_string(),
            }),
        );
    };

    match state.store.clear(&session_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ResetResponse {
                status: "success".to_string(),
                message: "Conversation reset".to_string(),
            }),
        ),
        Err(e) => {
            error!("failed to reset session {}: {}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ResetResponse {
                    status: "error".to_string(),
                    message: "Failed to reset".to_string(),
                }),
            )
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        openai_available: state.llm.is_some(),
    })
}
