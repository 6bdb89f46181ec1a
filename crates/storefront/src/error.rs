//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. JSON API handlers return `Result<T, AppError>`
//! and the client always gets an `{"error": "..."}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use febeflo_core::payment::ApiErrorBody;
use thiserror::Error;

use crate::gemini::GeminiError;
use crate::webpay::WebpayError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Webpay operation failed.
    #[error("Webpay error: {0}")]
    Webpay(#[from] WebpayError),

    /// Gemini operation failed.
    #[error("Gemini error: {0}")]
    Gemini(#[from] GeminiError),

    /// No Gemini API key is configured.
    #[error("chat assistant is not configured")]
    ChatNotConfigured,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Webpay(_) | Self::ChatNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gemini(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Webpay(_) | Self::Gemini(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if matches!(self, Self::ChatNotConfigured) {
            tracing::warn!("Chat request received but GEMINI_API_KEY is not set");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Webpay(_) => "Payment gateway error".to_string(),
            Self::Gemini(_) => "Chat assistant is unavailable".to_string(),
            Self::ChatNotConfigured | Self::BadRequest(_) => self.to_string(),
        };

        (self.status(), Json(ApiErrorBody { error: message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a step of the payment flow.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("payment", "Webpay callback received", Some(&[("order", "O-1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
