//! Request and response bodies of the Webpay Plus transaction API.
//!
//! Field names follow the gateway's snake_case JSON.

use febeflo_core::{BuyOrder, Clp, SessionId};
use serde::{Deserialize, Serialize};

/// Body of the create call.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRequest<'a> {
    pub buy_order: &'a BuyOrder,
    pub session_id: &'a SessionId,
    pub amount: Clp,
    pub return_url: &'a str,
}

/// Response of the create call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateResponse {
    /// Transaction token, posted back to `url` as `token_ws`.
    pub token: String,
    /// Gateway form URL.
    pub url: String,
}

/// Masked card data returned on commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CardDetail {
    /// Last four digits of the card.
    #[serde(default)]
    pub card_number: Option<String>,
}

/// Response of the commit call.
///
/// Only `response_code`, `amount` and `buy_order` are required. Everything
/// else is optional because the gateway omits fields on rejected payments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitResponse {
    /// `0` means authorized; any other value is a rejection.
    pub response_code: i64,
    pub amount: Clp,
    pub buy_order: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub vci: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub card_detail: Option<CardDetail>,
    #[serde(default)]
    pub accounting_date: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub authorization_code: Option<String>,
    #[serde(default)]
    pub payment_type_code: Option<String>,
    #[serde(default)]
    pub installments_amount: Option<u64>,
    #[serde(default)]
    pub installments_number: Option<u32>,
    #[serde(default)]
    pub balance: Option<u64>,
}

impl CommitResponse {
    /// Whether the gateway authorized the payment.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        self.response_code == 0
    }
}
