//! Chat assistant route handler.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Longest message forwarded to the model, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

/// Shopper message.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Assistant reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
}

/// Answer a shopper's question in the shop assistant persona.
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>> {
    let gemini = state.gemini().ok_or(AppError::ChatNotConfigured)?;
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let text = gemini.reply(message).await?;
    Ok(Json(ChatReply { text }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use febeflo_core::payment::ApiErrorBody;
    use secrecy::SecretString;
    use wiremock::matchers::method;
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::routes::testing::TestApp;

    async fn chat_app() -> TestApp {
        TestApp::start_with(|config| {
            config.gemini.api_key = Some(SecretString::from("AIzaSyTestKey"));
        })
        .await
    }

    #[tokio::test]
    async fn test_chat_reply() {
        let app = chat_app().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Abrimos sábados y domingos 🕘"}]}}]
            })))
            .expect(1)
            .mount(&app.gemini)
            .await;

        let response = app
            .json("/api/chat", &serde_json::json!({"message": "¿Qué días abren?"}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let reply: ChatReply = TestApp::body_json(response).await;
        assert_eq!(reply.text, "Abrimos sábados y domingos 🕘");
    }

    #[tokio::test]
    async fn test_chat_not_configured() {
        let app = TestApp::start().await;
        let response = app
            .json("/api/chat", &serde_json::json!({"message": "hola"}))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ApiErrorBody = TestApp::body_json(response).await;
        assert_eq!(body.error, "chat assistant is not configured");
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let app = chat_app().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&app.gemini)
            .await;

        let response = app
            .json("/api/chat", &serde_json::json!({"message": "   "}))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_502() {
        let app = chat_app().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&app.gemini)
            .await;

        let response = app
            .json("/api/chat", &serde_json::json!({"message": "hola"}))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: ApiErrorBody = TestApp::body_json(response).await;
        assert!(!body.error.contains("overloaded"));
    }
}
