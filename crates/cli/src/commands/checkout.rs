//! Checkout command: open a Webpay transaction for the current cart.
//!
//! The command plays the browser's part of the handshake. It asks the
//! storefront to open a transaction and hands back the auto-submitting form
//! that carries the token to the gateway. The cart is never modified here;
//! it is only cleared once a successful result is applied.

use febeflo_core::cart::{CartStorage, CartStore};
use febeflo_core::checkout::{CheckoutError, CheckoutFlow, GatewayRedirect};
use febeflo_core::shipping::Delivery;
use rand::Rng;
use thiserror::Error;

use crate::client::{ClientError, StorefrontClient};

/// Errors from a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutCommandError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("checkout did not produce a gateway redirect")]
    NoRedirect,
}

/// Run one checkout attempt and return where to send the shopper.
///
/// # Errors
///
/// Returns an error if the cart is empty or the storefront does not open a
/// transaction. Nothing is retried.
pub async fn run<S: CartStorage>(
    cart: &CartStore<S>,
    client: &StorefrontClient,
    delivery: &Delivery,
    rng: &mut impl Rng,
) -> Result<GatewayRedirect, CheckoutCommandError> {
    let mut flow = CheckoutFlow::new();
    let request = flow.begin(cart, delivery, rng)?;

    tracing::info!(
        buy_order = %request.buy_order,
        subtotal = %cart.total(),
        shipping = %delivery.fee(),
        amount = %request.amount,
        "Opening Webpay transaction"
    );

    match client.create_transaction(&request).await {
        Ok(response) => flow.transaction_created(response),
        Err(e) => {
            flow.creation_failed(e.to_string());
            return Err(e.into());
        }
    }

    flow.take_redirect().ok_or(CheckoutCommandError::NoRedirect)
}
