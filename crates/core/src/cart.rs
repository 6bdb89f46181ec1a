//! Shopper cart state container.
//!
//! The cart is owned by the shopper's client, never by the server. It holds
//! one line item per (product, size) pair and is written through a
//! [`CartStorage`] port after every mutation, so it survives restarts
//! without depending on the storefront backend being reachable.
//!
//! # Example
//!
//! ```rust
//! use febeflo_core::cart::{CartStore, MemoryStorage, Product};
//! use febeflo_core::{Clp, ProductId};
//!
//! let shirt = Product {
//!     id: ProductId::new(1),
//!     name: "Polera".to_string(),
//!     price: Clp::new(10000),
//!     image_url: None,
//!     category: "Hombres".to_string(),
//!     sizes: vec!["M".to_string(), "L".to_string()],
//! };
//!
//! let mut cart = CartStore::open(MemoryStorage::default());
//! cart.add_item(&shirt, Some("M"));
//! cart.add_item(&shirt, Some("M"));
//! assert_eq!(cart.total(), Clp::new(20000));
//! assert_eq!(cart.items_count(), 2);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Clp, ProductId};

/// Fixed key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "febeflo-cart";

/// A catalog product as offered to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Clp,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    /// Sizes offered for this product; empty for one-size items.
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// One (product, size) entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price at the time the item was first added.
    pub price: Clp,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    /// Always at least 1 while the line exists.
    pub quantity: u32,
    #[serde(
        rename = "selectedSize",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_size: Option<String>,
}

impl CartLineItem {
    fn from_product(product: &Product, size: Option<&str>) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            category: product.category.clone(),
            quantity: 1,
            selected_size: size.map(str::to_owned),
        }
    }

    /// Whether this line is the one for `(id, size)`.
    #[must_use]
    pub fn matches(&self, id: ProductId, size: Option<&str>) -> bool {
        self.id == id && self.selected_size.as_deref() == size
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Clp {
        self.price.times(self.quantity)
    }
}

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored cart could not be encoded or decoded.
    #[error("stored cart is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence port for the cart: load once on open, save after each change.
pub trait CartStorage {
    /// Load the persisted line items. An absent cart loads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or decoded.
    fn load(&self) -> Result<Vec<CartLineItem>, StorageError>;

    /// Replace the persisted line items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&mut self, items: &[CartLineItem]) -> Result<(), StorageError>;
}

/// In-memory storage, for tests and for embedding without persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Vec<CartLineItem>,
    saves: usize,
}

impl MemoryStorage {
    /// Storage pre-populated as if a previous session had saved `items`.
    #[must_use]
    pub const fn with_items(items: Vec<CartLineItem>) -> Self {
        Self { items, saves: 0 }
    }

    /// The most recently saved line items.
    #[must_use]
    pub fn saved(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Number of times `save` has been called.
    #[must_use]
    pub const fn save_count(&self) -> usize {
        self.saves
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<CartLineItem>, StorageError> {
        Ok(self.items.clone())
    }

    fn save(&mut self, items: &[CartLineItem]) -> Result<(), StorageError> {
        self.items = items.to_vec();
        self.saves += 1;
        Ok(())
    }
}

/// The shopper's cart.
///
/// Every operation completes synchronously and cannot fail. Storage errors
/// are logged and the in-memory state stays authoritative.
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    items: Vec<CartLineItem>,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the cart, reading whatever `storage` last saved.
    ///
    /// An unreadable stored cart is discarded and the cart starts empty.
    /// Stored lines with no units are dropped, and lines repeating a
    /// (product, size) pair are merged into the first one.
    pub fn open(storage: S) -> Self {
        let stored = storage.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable stored cart");
            Vec::new()
        });

        let mut cart = Self {
            items: Vec::with_capacity(stored.len()),
            storage,
        };
        for item in stored.into_iter().filter(|i| i.quantity > 0) {
            if let Some(line) = cart.line_mut(item.id, item.selected_size.as_deref()) {
                tracing::warn!(product_id = %item.id, "Merging duplicate stored cart line");
                line.quantity = line.quantity.saturating_add(item.quantity);
            } else {
                cart.items.push(item);
            }
        }
        cart
    }

    /// Line items in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product` in `size`.
    ///
    /// Increments the existing line for the pair, or appends a new line with
    /// quantity 1.
    pub fn add_item(&mut self, product: &Product, size: Option<&str>) {
        if let Some(line) = self.line_mut(product.id, size) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.items.push(CartLineItem::from_product(product, size));
        }
        self.persist();
    }

    /// Remove the line for `(id, size)`. Does nothing if there is none.
    pub fn remove_item(&mut self, id: ProductId, size: Option<&str>) {
        let before = self.items.len();
        self.items.retain(|line| !line.matches(id, size));
        if self.items.len() != before {
            self.persist();
        }
    }

    /// Set the quantity for `(id, size)`.
    ///
    /// A quantity of zero or less removes the line. Does nothing if the pair
    /// is not in the cart.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64, size: Option<&str>) {
        if quantity <= 0 {
            self.remove_item(id, size);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.line_mut(id, size) {
            line.quantity = quantity;
            self.persist();
        }
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Sum of unit price times quantity over every line.
    #[must_use]
    pub fn total(&self) -> Clp {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Number of units in the cart (not distinct lines).
    #[must_use]
    pub fn items_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn line_mut(&mut self, id: ProductId, size: Option<&str>) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|line| line.matches(id, size))
    }

    fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.items) {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
    }
}
