//! Cart editing commands.

use std::io::{self, Write};

use febeflo_core::ProductId;
use febeflo_core::cart::{CartStorage, CartStore, Product};

/// Add one unit of a product and print the updated cart.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn add<S: CartStorage>(
    cart: &mut CartStore<S>,
    product: &Product,
    size: Option<&str>,
    out: &mut impl Write,
) -> io::Result<()> {
    cart.add_item(product, size);
    tracing::info!(product_id = %product.id, size, "Added to cart");
    show(cart, out)
}

/// Remove a line and print the updated cart.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn remove<S: CartStorage>(
    cart: &mut CartStore<S>,
    id: ProductId,
    size: Option<&str>,
    out: &mut impl Write,
) -> io::Result<()> {
    cart.remove_item(id, size);
    show(cart, out)
}

/// Set a line's quantity (zero or less removes it) and print the cart.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn update<S: CartStorage>(
    cart: &mut CartStore<S>,
    id: ProductId,
    quantity: i64,
    size: Option<&str>,
    out: &mut impl Write,
) -> io::Result<()> {
    cart.update_quantity(id, quantity, size);
    show(cart, out)
}

/// Print one row per line item, then units and subtotal.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn show<S: CartStorage>(cart: &CartStore<S>, out: &mut impl Write) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty");
    }

    for line in cart.items() {
        let size = line
            .selected_size
            .as_deref()
            .map(|s| format!(" ({s})"))
            .unwrap_or_default();
        writeln!(
            out,
            "#{id} {name}{size} x{qty}  {total}",
            id = line.id,
            name = line.name,
            qty = line.quantity,
            total = line.line_total(),
        )?;
    }
    writeln!(
        out,
        "{} units, subtotal {}",
        cart.items_count(),
        cart.total()
    )
}
