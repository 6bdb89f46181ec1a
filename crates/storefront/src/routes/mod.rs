//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check
//!
//! # Payment
//! POST /api/payment/create     - Open a Webpay transaction (JSON)
//! POST /api/payment/commit     - Webpay return (form body)
//! GET  /api/payment/commit     - Webpay return (query string)
//! GET  /payment/return         - Outcome page
//!
//! # Chat
//! POST /api/chat               - Ask the shop assistant (JSON)
//! ```
//!
//! Everything under `/api` is rate limited per client IP, and the chat
//! endpoint has a tighter limit of its own.

pub mod chat;
pub mod payment;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use febeflo_core::payment::RESULT_PATH;

use crate::middleware::{api_rate_limiter, chat_rate_limiter};
use crate::state::AppState;

/// Create the payment API routes router.
pub fn payment_api_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(payment::create))
        .route(
            "/commit",
            post(payment::commit_form).get(payment::commit_query),
        )
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/payment", payment_api_routes())
        .route("/chat", post(chat::send).layer(chat_rate_limiter()))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route(RESULT_PATH, get(payment::result_page))
        .nest("/api", api_routes().layer(api_rate_limiter()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// The server keeps no connections to warm up, so it is ready as soon as it
/// is serving.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}
