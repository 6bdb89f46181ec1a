//! Wire contract for the payment handshake.
//!
//! The storefront server and its clients share these types: the create
//! endpoint's request and response bodies, and the [`PaymentOutcome`] the
//! commit endpoint encodes into the result page URL.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use crate::cart::{CartStorage, CartStore};
use crate::types::{BuyOrder, Clp, PaymentStatus, SessionId};

/// Endpoint that opens a gateway transaction.
pub const CREATE_PATH: &str = "/api/payment/create";

/// Endpoint the gateway redirects the shopper back to.
pub const COMMIT_PATH: &str = "/api/payment/commit";

/// Page that shows the outcome of a checkout attempt.
pub const RESULT_PATH: &str = "/payment/return";

/// Body of `POST /api/payment/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub amount: Clp,
    pub buy_order: BuyOrder,
    pub session_id: SessionId,
}

/// Successful response of `POST /api/payment/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    /// Gateway-issued transaction token.
    pub token: String,
    /// Gateway URL the token must be posted to.
    pub url: String,
}

/// JSON error body returned by the storefront API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Errors parsing a result page URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeError {
    /// No `status` parameter was present.
    #[error("result URL has no status parameter")]
    MissingStatus,

    /// The `status` parameter had an unknown value.
    #[error("{0}")]
    InvalidStatus(String),
}

/// What the result page is told about a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub amount: Option<Clp>,
    pub order: Option<String>,
    pub auth_code: Option<String>,
    pub date: Option<String>,
    pub message: Option<String>,
}

impl PaymentOutcome {
    /// The shopper cancelled at the gateway.
    #[must_use]
    pub const fn aborted(order: Option<String>) -> Self {
        Self {
            status: PaymentStatus::Aborted,
            amount: None,
            order,
            auth_code: None,
            date: None,
            message: None,
        }
    }

    /// The commit could not be completed.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Error,
            amount: None,
            order: None,
            auth_code: None,
            date: None,
            message: Some(message.into()),
        }
    }

    /// Outcome of a completed gateway commit.
    ///
    /// Only `response_code == 0` is a success. The authorization code and
    /// date are always echoed, empty when the gateway omitted them.
    #[must_use]
    pub fn committed(
        response_code: i64,
        amount: Clp,
        order: String,
        auth_code: Option<String>,
        date: Option<String>,
    ) -> Self {
        Self {
            status: PaymentStatus::from_response_code(response_code),
            amount: Some(amount),
            order: Some(order),
            auth_code: Some(auth_code.unwrap_or_default()),
            date: Some(date.unwrap_or_default()),
            message: None,
        }
    }

    /// Encode as a query string (`status=...&amount=...`).
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("status", self.status.as_str());
        if let Some(amount) = self.amount {
            query.append_pair("amount", &amount.pesos().to_string());
        }
        for (key, value) in [
            ("order", &self.order),
            ("auth_code", &self.auth_code),
            ("date", &self.date),
            ("message", &self.message),
        ] {
            if let Some(value) = value {
                query.append_pair(key, value);
            }
        }
        query.finish()
    }

    /// Absolute result page URL under `base_url`.
    #[must_use]
    pub fn result_url(&self, base_url: &str) -> String {
        format!(
            "{}{RESULT_PATH}?{}",
            base_url.trim_end_matches('/'),
            self.to_query()
        )
    }

    /// Parse from a result page URL or its bare query string.
    ///
    /// A bare query is taken whole, so values may contain '?'.
    /// Empty parameters are treated as absent. An unparseable amount is
    /// dropped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if `status` is missing or unknown.
    pub fn from_query(input: &str) -> Result<Self, OutcomeError> {
        let parsed = url::Url::parse(input).ok();
        let query = match &parsed {
            Some(url) => url.query().unwrap_or_default(),
            // Path-only URL: the first '?' ends the path
            None if input.starts_with('/') => input
                .split_once('?')
                .map_or("", |(_, query)| query)
                .split('#')
                .next()
                .unwrap_or_default(),
            None => input.strip_prefix('?').unwrap_or(input),
        };

        let mut status = None;
        let mut outcome = Self::aborted(None);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "status" => {
                    status = Some(
                        value
                            .parse::<PaymentStatus>()
                            .map_err(OutcomeError::InvalidStatus)?,
                    );
                }
                "amount" => outcome.amount = value.parse::<u64>().ok().map(Clp::new),
                "order" => outcome.order = Some(value.into_owned()),
                "auth_code" => outcome.auth_code = Some(value.into_owned()),
                "date" => outcome.date = Some(value.into_owned()),
                "message" => outcome.message = Some(value.into_owned()),
                _ => {}
            }
        }

        outcome.status = status.ok_or(OutcomeError::MissingStatus)?;
        Ok(outcome)
    }

    /// Apply the outcome to the shopper's cart.
    ///
    /// Empties the cart on success and leaves it untouched otherwise, so a
    /// failed or cancelled payment can be retried. Returns whether the cart
    /// was cleared.
    pub fn settle_cart<S: CartStorage>(&self, cart: &mut CartStore<S>) -> bool {
        if self.status.is_success() {
            cart.clear_cart();
            true
        } else {
            false
        }
    }

    /// Transaction date formatted for display (`dd-mm-yyyy HH:MM UTC`).
    ///
    /// The gateway's offset is normalised to UTC and labelled as such. Falls
    /// back to the raw value when it is not RFC 3339.
    #[must_use]
    pub fn display_date(&self) -> Option<String> {
        let raw = self.date.as_deref()?;
        Some(chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
            |_| raw.to_string(),
            |d| {
                d.with_timezone(&chrono::Utc)
                    .format("%d-%m-%Y %H:%M UTC")
                    .to_string()
            },
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{MemoryStorage, Product};
    use crate::types::ProductId;

    fn cart_with_one_item() -> CartStore<MemoryStorage> {
        let mut cart = CartStore::open(MemoryStorage::default());
        cart.add_item(
            &Product {
                id: ProductId::new(1),
                name: "Blusa".to_string(),
                price: Clp::new(15000),
                image_url: None,
                category: "Mujeres".to_string(),
                sizes: vec![],
            },
            None,
        );
        cart
    }

    #[test]
    fn test_success_query_encoding() {
        let outcome = PaymentOutcome::committed(
            0,
            Clp::new(15000),
            "O-1".to_string(),
            Some("AUTH1".to_string()),
            None,
        );
        assert_eq!(
            outcome.to_query(),
            "status=success&amount=15000&order=O-1&auth_code=AUTH1&date="
        );
    }

    #[test]
    fn test_aborted_query_encoding() {
        let outcome = PaymentOutcome::aborted(Some("O-123".to_string()));
        assert_eq!(outcome.to_query(), "status=aborted&order=O-123");
        assert_eq!(
            outcome.result_url("https://febeflo.cl/"),
            "https://febeflo.cl/payment/return?status=aborted&order=O-123"
        );
    }

    #[test]
    fn test_error_message_is_percent_encoded() {
        let outcome = PaymentOutcome::error("a & b");
        assert_eq!(outcome.to_query(), "status=error&message=a+%26+b");
    }

    #[test]
    fn test_from_query_accepts_full_url() {
        let outcome = PaymentOutcome::from_query(
            "http://localhost:3000/payment/return?status=success&amount=15000&order=O-1&auth_code=AUTH1&date=",
        )
        .unwrap();
        assert_eq!(outcome.status, PaymentStatus::Success);
        assert_eq!(outcome.amount, Some(Clp::new(15000)));
        assert_eq!(outcome.order.as_deref(), Some("O-1"));
        assert_eq!(outcome.auth_code.as_deref(), Some("AUTH1"));
        assert_eq!(outcome.date, None);
    }

    #[test]
    fn test_from_query_keeps_question_marks_in_values() {
        let outcome = PaymentOutcome::from_query("status=error&message=¿qué?").unwrap();
        assert_eq!(outcome.status, PaymentStatus::Error);
        assert_eq!(outcome.message.as_deref(), Some("¿qué?"));

        let outcome =
            PaymentOutcome::from_query("/payment/return?status=error&message=why?#top").unwrap();
        assert_eq!(outcome.message.as_deref(), Some("why?"));

        let outcome = PaymentOutcome::from_query(
            "http://127.0.0.1:3000/payment/return?status=failed&message=a?b#frag",
        )
        .unwrap();
        assert_eq!(outcome.status, PaymentStatus::Failed);
        assert_eq!(outcome.message.as_deref(), Some("a?b"));
    }

    #[test]
    fn test_from_query_requires_known_status() {
        assert_eq!(
            PaymentOutcome::from_query("order=O-1"),
            Err(OutcomeError::MissingStatus)
        );
        assert!(matches!(
            PaymentOutcome::from_query("?status=paid"),
            Err(OutcomeError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_success_clears_cart() {
        let mut cart = cart_with_one_item();
        let outcome = PaymentOutcome::from_query("status=success&order=O-1").unwrap();
        assert!(outcome.settle_cart(&mut cart));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_non_success_keeps_cart() {
        for query in ["status=failed", "status=aborted", "status=error&message=x"] {
            let mut cart = cart_with_one_item();
            let outcome = PaymentOutcome::from_query(query).unwrap();
            assert!(!outcome.settle_cart(&mut cart));
            assert_eq!(cart.items_count(), 1);
        }
    }

    #[test]
    fn test_display_date() {
        let mut outcome = PaymentOutcome::aborted(None);
        outcome.date = Some("2025-11-29T15:04:05.123Z".to_string());
        assert_eq!(outcome.display_date().as_deref(), Some("29-11-2025 15:04 UTC"));

        outcome.date = Some("2025-11-29T12:04:05-03:00".to_string());
        assert_eq!(outcome.display_date().as_deref(), Some("29-11-2025 15:04 UTC"));

        outcome.date = Some("yesterday".to_string());
        assert_eq!(outcome.display_date().as_deref(), Some("yesterday"));
    }

    #[test]
    fn test_create_request_uses_camel_case() {
        let request = CreateTransactionRequest {
            amount: Clp::new(23990),
            buy_order: BuyOrder::parse("O-1").unwrap(),
            session_id: SessionId::parse("S-1").unwrap(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"amount": 23990, "buyOrder": "O-1", "sessionId": "S-1"})
        );
    }
}
