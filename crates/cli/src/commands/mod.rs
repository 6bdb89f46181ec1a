//! Shopper commands.

pub mod cart;
pub mod checkout;
pub mod result;

use std::path::Path;

use febeflo_core::cart::CartStore;

use crate::storage::JsonFileStorage;

/// Open the cart persisted under `data_dir`.
pub fn open_cart(data_dir: &Path) -> CartStore<JsonFileStorage> {
    let storage = JsonFileStorage::new(data_dir);
    tracing::debug!(path = %storage.path().display(), "Opening cart");
    CartStore::open(storage)
}
