//! Webpay payment handshake route handlers.
//!
//! ```text
//! shopper ──POST /api/payment/create──▶ storefront ──create──▶ Webpay
//!         ◀──────{token, url}─────────
//! shopper ──POST token_ws to url──────▶ Webpay
//! Webpay  ──POST|GET /api/payment/commit─▶ storefront ──commit──▶ Webpay
//! shopper ◀──303 /payment/return?status=...
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{
        Query, RawQuery, State,
        rejection::{FormRejection, JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Redirect, Response},
};
use febeflo_core::payment::{CreateTransactionRequest, CreateTransactionResponse, PaymentOutcome};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;

/// Redirect message used when commit error details are not exposed.
pub const GENERIC_COMMIT_ERROR: &str = "No pudimos confirmar el pago con Webpay";

// =============================================================================
// Create
// =============================================================================

/// Open a Webpay transaction for a checkout attempt.
///
/// The gateway is told to send the shopper back to the commit endpoint under
/// the configured base URL.
#[instrument(skip_all, fields(buy_order = tracing::field::Empty))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<CreateTransactionResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if request.amount.is_zero() {
        return Err(AppError::BadRequest("amount must be positive".to_string()));
    }

    tracing::Span::current().record("buy_order", request.buy_order.as_str());
    let return_url = state.config().commit_url();
    let created = state
        .webpay()
        .create(
            &request.buy_order,
            &request.session_id,
            request.amount,
            &return_url,
        )
        .await?;

    add_breadcrumb(
        "payment",
        "Webpay transaction created",
        Some(&[("buy_order", request.buy_order.as_str())]),
    );

    Ok(Json(CreateTransactionResponse {
        token: created.token,
        url: created.url,
    }))
}

// =============================================================================
// Commit
// =============================================================================

/// Parameters Webpay sends when the shopper comes back.
///
/// A normal return carries `token_ws`. A cancelled payment carries
/// `TBK_TOKEN`, `TBK_ORDEN_COMPRA` and `TBK_ID_SESION` instead.
#[derive(Debug, Default, Deserialize)]
pub struct CommitCallback {
    #[serde(default)]
    pub token_ws: Option<String>,
    #[serde(default, rename = "TBK_TOKEN")]
    pub tbk_token: Option<String>,
    #[serde(default, rename = "TBK_ORDEN_COMPRA")]
    pub tbk_orden_compra: Option<String>,
    #[serde(default, rename = "TBK_ID_SESION")]
    pub tbk_id_sesion: Option<String>,
}

/// What to do with a callback.
#[derive(Debug, PartialEq, Eq)]
pub enum CallbackAction<'a> {
    /// Confirm the transaction with this token.
    Commit(&'a str),
    /// The shopper cancelled; nothing to confirm.
    Aborted { order: Option<&'a str> },
    /// Neither token was sent.
    MissingToken,
}

impl CommitCallback {
    /// Decide how to handle the callback. Empty values count as absent.
    #[must_use]
    pub fn action(&self) -> CallbackAction<'_> {
        match (
            non_empty(self.token_ws.as_deref()),
            non_empty(self.tbk_token.as_deref()),
        ) {
            (Some(token), _) => CallbackAction::Commit(token),
            (None, Some(_)) => CallbackAction::Aborted {
                order: non_empty(self.tbk_orden_compra.as_deref()),
            },
            (None, None) => CallbackAction::MissingToken,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Gateway return via form POST.
pub async fn commit_form(
    State(state): State<AppState>,
    form: std::result::Result<Form<CommitCallback>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(callback)) => settle(&state, &callback).await,
        Err(rejection) => unreadable_callback(&state, &rejection.body_text()),
    }
}

/// Gateway return via GET (timeouts and some cancellations).
pub async fn commit_query(
    State(state): State<AppState>,
    query: std::result::Result<Query<CommitCallback>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(callback)) => settle(&state, &callback).await,
        Err(rejection) => unreadable_callback(&state, &rejection.body_text()),
    }
}

#[instrument(skip_all, fields(order = tracing::field::Empty))]
async fn settle(state: &AppState, callback: &CommitCallback) -> Response {
    let outcome = match callback.action() {
        CallbackAction::MissingToken => {
            tracing::warn!(
                has_session = callback.tbk_id_sesion.is_some(),
                "Webpay callback without token"
            );
            return AppError::BadRequest("payment token not received".to_string())
                .into_response();
        }
        CallbackAction::Aborted { order } => {
            tracing::Span::current().record("order", order.unwrap_or_default());
            tracing::info!("Payment aborted by shopper");
            PaymentOutcome::aborted(order.map(str::to_owned))
        }
        CallbackAction::Commit(token) => match state.webpay().commit(token).await {
            Ok(committed) => {
                tracing::Span::current().record("order", committed.buy_order.as_str());
                PaymentOutcome::committed(
                    committed.response_code,
                    committed.amount,
                    committed.buy_order,
                    committed.authorization_code,
                    committed.transaction_date,
                )
            }
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(
                    error = %e,
                    sentry_event_id = %event_id,
                    "Webpay commit failed"
                );
                PaymentOutcome::error(redirect_message(state, &e.to_string()))
            }
        },
    };

    add_breadcrumb(
        "payment",
        "Webpay callback settled",
        Some(&[("status", outcome.status.as_str())]),
    );
    redirect_to_result(state, &outcome)
}

fn unreadable_callback(state: &AppState, detail: &str) -> Response {
    tracing::warn!(detail, "Unreadable Webpay callback");
    redirect_to_result(state, &PaymentOutcome::error(redirect_message(state, detail)))
}

/// Raw error text if exposure is enabled, otherwise the generic message.
fn redirect_message(state: &AppState, raw: &str) -> String {
    if state.config().expose_payment_errors {
        raw.to_string()
    } else {
        GENERIC_COMMIT_ERROR.to_string()
    }
}

fn redirect_to_result(state: &AppState, outcome: &PaymentOutcome) -> Response {
    Redirect::to(&outcome.result_url(&state.config().base_url)).into_response()
}

// =============================================================================
// Result page
// =============================================================================

/// Outcome page shown after the gateway round trip.
#[derive(Template, WebTemplate)]
#[template(path = "payment/return.html")]
pub struct PaymentReturnTemplate {
    /// `success`, `failed`, `aborted`, `error`, or `unknown`
    pub status: &'static str,
    pub order: Option<String>,
    pub amount: Option<String>,
    pub auth_code: Option<String>,
    pub date: Option<String>,
    pub message: Option<String>,
}

impl PaymentReturnTemplate {
    fn from_query(query: &str) -> Self {
        match PaymentOutcome::from_query(query) {
            Ok(outcome) => Self {
                status: outcome.status.as_str(),
                amount: outcome.amount.map(|a| a.to_string()),
                date: outcome.display_date(),
                order: outcome.order,
                auth_code: outcome.auth_code,
                message: outcome.message,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Result page without a valid status");
                Self {
                    status: "unknown",
                    order: None,
                    amount: None,
                    auth_code: None,
                    date: None,
                    message: None,
                }
            }
        }
    }
}

/// Render the payment outcome from the redirect query string.
pub async fn result_page(RawQuery(query): RawQuery) -> impl IntoResponse {
    PaymentReturnTemplate::from_query(query.as_deref().unwrap_or_default())
}
