//! Client side of the checkout handshake.
//!
//! ```text
//! Idle ──begin──▶ Creating ──transaction_created──▶ Redirecting ──take_redirect──▶ Submitted
//!                    │
//!                    └──creation_failed──▶ Failed
//! ```
//!
//! The gateway redirect is armed once per attempt and consumed by
//! [`CheckoutFlow::take_redirect`], so re-rendering the checkout view can
//! never post the token twice. Nothing is retried: a failed attempt stays
//! failed until [`CheckoutFlow::reset`], and the next `begin` generates new
//! identifiers.

use askama::Template;
use rand::Rng;
use thiserror::Error;

use crate::cart::{CartStorage, CartStore};
use crate::payment::{CreateTransactionRequest, CreateTransactionResponse};
use crate::shipping::Delivery;
use crate::types::{BuyOrder, Clp, SessionId};

/// Name of the form field the gateway expects the token in.
pub const TOKEN_FIELD: &str = "token_ws";

/// Errors starting a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// There is nothing to pay for.
    #[error("cart is empty")]
    EmptyCart,

    /// A previous attempt has not finished.
    #[error("a checkout attempt is already in progress")]
    InProgress,
}

/// Where the shopper's browser must be sent to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRedirect {
    pub url: String,
    pub token: String,
}

impl GatewayRedirect {
    /// An HTML page whose form posts the token to the gateway on load.
    ///
    /// # Errors
    ///
    /// Returns an error if the page template fails to render.
    pub fn auto_submit_form(&self) -> askama::Result<String> {
        GatewayRedirectPage {
            url: &self.url,
            field: TOKEN_FIELD,
            token: &self.token,
        }
        .render()
    }
}

#[derive(Template)]
#[template(path = "gateway_redirect.html")]
struct GatewayRedirectPage<'a> {
    url: &'a str,
    field: &'a str,
    token: &'a str,
}

/// Where a checkout attempt stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// No attempt in progress.
    Idle,
    /// Waiting for the server to open a transaction.
    Creating(CreateTransactionRequest),
    /// The gateway redirect is ready and not yet submitted.
    Redirecting(GatewayRedirect),
    /// The shopper has been sent to the gateway.
    Submitted(GatewayRedirect),
    /// Opening the transaction failed; shown to the shopper as-is.
    Failed(String),
}

/// One shopper's checkout attempts.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    /// A flow with no attempt in progress.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CheckoutState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Start an attempt: charge the cart subtotal plus the delivery fee.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or an attempt is already
    /// creating or redirecting.
    pub fn begin<S: CartStorage>(
        &mut self,
        cart: &CartStore<S>,
        delivery: &Delivery,
        rng: &mut impl Rng,
    ) -> Result<CreateTransactionRequest, CheckoutError> {
        if matches!(
            self.state,
            CheckoutState::Creating(_) | CheckoutState::Redirecting(_)
        ) {
            return Err(CheckoutError::InProgress);
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let request = CreateTransactionRequest {
            amount: amount_due(cart, delivery),
            buy_order: BuyOrder::generate(rng),
            session_id: SessionId::generate(rng),
        };
        tracing::debug!(
            buy_order = %request.buy_order,
            amount = request.amount.pesos(),
            "Checkout started"
        );
        self.state = CheckoutState::Creating(request.clone());
        Ok(request)
    }

    /// The server opened the transaction. Ignored unless creating.
    pub fn transaction_created(&mut self, response: CreateTransactionResponse) {
        if matches!(self.state, CheckoutState::Creating(_)) {
            self.state = CheckoutState::Redirecting(GatewayRedirect {
                url: response.url,
                token: response.token,
            });
        }
    }

    /// Opening the transaction failed. Ignored unless creating.
    pub fn creation_failed(&mut self, message: impl Into<String>) {
        if matches!(self.state, CheckoutState::Creating(_)) {
            let message = message.into();
            tracing::warn!(%message, "Checkout could not start");
            self.state = CheckoutState::Failed(message);
        }
    }

    /// Take the gateway redirect. Returns it at most once per attempt.
    pub fn take_redirect(&mut self) -> Option<GatewayRedirect> {
        match std::mem::replace(&mut self.state, CheckoutState::Idle) {
            CheckoutState::Redirecting(redirect) => {
                self.state = CheckoutState::Submitted(redirect.clone());
                Some(redirect)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Forget the current attempt so the shopper can check out again.
    pub fn reset(&mut self) {
        self.state = CheckoutState::Idle;
    }
}

/// Cart subtotal plus delivery fee.
#[must_use]
pub fn amount_due<S: CartStorage>(cart: &CartStore<S>, delivery: &Delivery) -> Clp {
    cart.total() + delivery.fee()
}
