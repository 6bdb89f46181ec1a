//! Apply the outcome of a payment to the local cart.

use std::io::{self, Write};

use febeflo_core::cart::{CartStorage, CartStore};
use febeflo_core::payment::{OutcomeError, PaymentOutcome};
use thiserror::Error;

/// Errors applying a result URL.
#[derive(Debug, Error)]
pub enum ResultCommandError {
    #[error("not a payment result: {0}")]
    Outcome(#[from] OutcomeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parse a result page URL (or its query), print it, and settle the cart.
///
/// The cart is emptied only when the payment succeeded.
///
/// # Errors
///
/// Returns an error if the input has no valid `status`, or writing fails.
pub fn apply<S: CartStorage>(
    input: &str,
    cart: &mut CartStore<S>,
    out: &mut impl Write,
) -> Result<PaymentOutcome, ResultCommandError> {
    let outcome = PaymentOutcome::from_query(input.trim())?;

    writeln!(out, "Payment {}", outcome.status)?;
    if let Some(order) = &outcome.order {
        writeln!(out, "  order: {order}")?;
    }
    if let Some(amount) = outcome.amount {
        writeln!(out, "  amount: {amount}")?;
    }
    if let Some(code) = outcome.auth_code.as_deref().filter(|c| !c.is_empty()) {
        writeln!(out, "  authorization code: {code}")?;
    }
    if let Some(date) = outcome.display_date().filter(|d| !d.is_empty()) {
        writeln!(out, "  date: {date}")?;
    }
    if let Some(message) = &outcome.message {
        writeln!(out, "  message: {message}")?;
    }

    if outcome.settle_cart(cart) {
        writeln!(out, "Cart cleared")?;
    } else {
        writeln!(out, "Cart kept, you can try again")?;
    }

    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use febeflo_core::cart::{MemoryStorage, Product};
    use febeflo_core::{Clp, PaymentStatus, ProductId};

    use super::*;

    fn cart() -> CartStore<MemoryStorage> {
        let mut cart = CartStore::open(MemoryStorage::default());
        cart.add_item(
            &Product {
                id: ProductId::new(5),
                name: "Polerón".to_string(),
                price: Clp::new(15000),
                image_url: None,
                category: "Niños".to_string(),
                sizes: vec![],
            },
            None,
        );
        cart
    }

    #[test]
    fn test_success_clears_cart() {
        let mut cart = cart();
        let mut out = Vec::new();
        let outcome = apply(
            "http://shop.test/payment/return?status=success&amount=15000&order=O-1&auth_code=1213&date=2025-11-29T15%3A04%3A05.123Z",
            &mut cart,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Success);
        assert!(cart.is_empty());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("amount: $15.000"));
        assert!(printed.contains("date: 29-11-2025 15:04 UTC"));
        assert!(printed.ends_with("Cart cleared\n"));
    }

    #[test]
    fn test_failure_keeps_cart() {
        let mut cart = cart();
        let mut out = Vec::new();
        apply("status=failed&order=O-2", &mut cart, &mut out).unwrap();

        assert_eq!(cart.items_count(), 1);
        assert!(String::from_utf8(out).unwrap().contains("Cart kept"));
    }

    #[test]
    fn test_missing_status_is_rejected() {
        let mut cart = cart();
        let err = apply("order=O-3", &mut cart, &mut Vec::new()).unwrap_err();

        assert!(matches!(
            err,
            ResultCommandError::Outcome(OutcomeError::MissingStatus)
        ));
        assert_eq!(cart.items_count(), 1);
    }
}
