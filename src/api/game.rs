//! Game API endpoints
//!
//! The playing surface: send turns, restart, fetch history, ask for a
//! scene image, speak narration aloud.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::conversation::Turn;
use crate::images::GeneratedImage;
use crate::session::SessionReply;

/// Build game router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/restart", post(restart))
        .route("/api/conversation", get(conversation))
        .route("/api/transcript", get(transcript))
        .route("/api/image", post(image))
        .route("/api/speak", post(speak))
        .route("/api/voice/stop", post(stop_speaking))
        .with_state(state)
}

/// A player turn: typed text, a selected option, or both
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub option: Option<String>,
}

impl ChatRequest {
    /// The text to play; a selected option wins over typed text
    fn effective_text(&self) -> Option<&str> {
        let pick = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
        };

        pick(&self.option).or_else(|| pick(&self.message))
    }
}

/// Play one turn
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<SessionReply>, GameError> {
    let text = request
        .effective_text()
        .ok_or(GameError::BadRequest("empty message"))?;

    let mut session = state.session.lock().await;
    let reply = session
        .send(text)
        .await
        .map_err(|e| GameError::ChatFailed(e.to_string()))?;

    Ok(Json(reply))
}

/// Restart response
#[derive(Debug, Serialize)]
pub struct RestartResponse {
    pub opening: String,
}

/// Restart the game
async fn restart(State(state): State<Arc<ApiState>>) -> Json<RestartResponse> {
    let mut session = state.session.lock().await;
    session.restart();

    Json(RestartResponse {
        opening: session.scenario().opening().to_string(),
    })
}

/// Full turn history
async fn conversation(State(state): State<Arc<ApiState>>) -> Json<Vec<Turn>> {
    let session = state.session.lock().await;
    Json(session.conversation().turns().to_vec())
}

/// Plain-text transcript
async fn transcript(State(state): State<Arc<ApiState>>) -> String {
    state.session.lock().await.transcript()
}

/// Scene image request
#[derive(Debug, Default, Deserialize)]
pub struct ImageRequest {
    /// Text to illustrate; defaults to the latest narrator reply
    #[serde(default)]
    pub subject: Option<String>,
}

/// Generate a scene image
async fn image(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<GeneratedImage>, GameError> {
    let images = state
        .images
        .as_ref()
        .ok_or(GameError::NotConfigured("image generation not configured"))?;

    // Build the prompt under the lock, then release it; generation can
    // poll a local backend for a while
    let prompt = {
        let session = state.session.lock().await;
        match request
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty())
        {
            Some(subject) => session.scenario().image_prompt(subject),
            None => session
                .scene_prompt()
                .ok_or(GameError::BadRequest("no scene to illustrate"))?,
        }
    };

    let generated = images
        .generate(&prompt)
        .await
        .map_err(|e| GameError::ImageFailed(e.to_string()))?;

    Ok(Json(generated))
}

/// Speak request
#[derive(Debug, Default, Deserialize)]
pub struct SpeakRequest {
    /// Text to speak; defaults to the latest narrator reply
    #[serde(default)]
    pub text: Option<String>,
}

/// Speak narration aloud, cancelling any speech in progress
async fn speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeakRequest>,
) -> Result<StatusCode, GameError> {
    let speaker = state
        .speaker
        .as_ref()
        .ok_or(GameError::NotConfigured("voice output not configured"))?;

    let text = match request
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        Some(text) => text.to_string(),
        None => state
            .session
            .lock()
            .await
            .last_reply()
            .map(ToString::to_string)
            .ok_or(GameError::BadRequest("nothing to speak"))?,
    };

    speaker
        .lock()
        .await
        .speak(&text)
        .await
        .map_err(|e| GameError::SpeechFailed(e.to_string()))?;

    // Playback continues in the background
    Ok(StatusCode::ACCEPTED)
}

/// Stop response
#[derive(Debug, Serialize)]
pub struct StopResponse {
    /// Whether an utterance was actually playing
    pub stopped: bool,
}

/// Stop any speech in progress
async fn stop_speaking(State(state): State<Arc<ApiState>>) -> Result<Json<StopResponse>, GameError> {
    let speaker = state
        .speaker
        .as_ref()
        .ok_or(GameError::NotConfigured("voice output not configured"))?;

    let mut speaker = speaker.lock().await;
    let stopped = speaker.is_speaking();
    speaker.stop();

    Ok(Json(StopResponse { stopped }))
}

/// Game API errors
#[derive(Debug)]
pub enum GameError {
    BadRequest(&'static str),
    NotConfigured(&'static str),
    ChatFailed(String),
    ImageFailed(String),
    SpeechFailed(String),
}

impl IntoResponse for GameError {
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
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.to_string()),
            Self::NotConfigured(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg.to_string())
            }
            Self::ChatFailed(msg) => (StatusCode::BAD_GATEWAY, "chat_failed", msg),
            Self::ImageFailed(msg) => (StatusCode::BAD_GATEWAY, "image_failed", msg),
            Self::SpeechFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "speech_failed", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_option_wins_over_typed_text() {
        let request = ChatRequest {
            message: Some("typed".to_string()),
            option: Some("Go left".to_string()),
        };
        assert_eq!(request.effective_text(), Some("Go left"));
    }

    #[test]
    fn blank_option_falls_back_to_message() {
        let request = ChatRequest {
            message: Some("  typed  ".to_string()),
            option: Some("   ".to_string()),
        };
        assert_eq!(request.effective_text(), Some("typed"));
    }

    #[test]
    fn empty_request_has_no_text() {
        assert_eq!(ChatRequest::default().effective_text(), None);
    }
}
