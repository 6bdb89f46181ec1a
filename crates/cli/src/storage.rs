//! Cart persistence in a JSON file under the data directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use febeflo_core::cart::{CART_STORAGE_KEY, CartLineItem, CartStorage, StorageError};

/// Stores the cart as a JSON array in `<data-dir>/febeflo-cart.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage for the cart file inside `data_dir`.
    ///
    /// The directory is created on first save.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{CART_STORAGE_KEY}.json")),
        }
    }

    /// Location of the cart file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<CartLineItem>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, items: &[CartLineItem]) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(items)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use febeflo_core::cart::{CartStore, Product};
    use febeflo_core::{Clp, ProductId};

    use super::*;

    fn vestido() -> Product {
        Product {
            id: ProductId::new(7),
            name: "Vestido floral".to_string(),
            price: Clp::new(24990),
            image_url: Some("https://cdn.febeflo.cl/vestido.jpg".to_string()),
            category: "Mujeres".to_string(),
            sizes: vec!["S".to_string(), "M".to_string()],
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_path_uses_storage_key() {
        let storage = JsonFileStorage::new(Path::new("/tmp/shop"));
        assert_eq!(storage.path(), Path::new("/tmp/shop/febeflo-cart.json"));
    }

    #[test]
    fn test_cart_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut cart = CartStore::open(JsonFileStorage::new(dir.path()));
        cart.add_item(&vestido(), Some("M"));
        cart.add_item(&vestido(), Some("M"));
        drop(cart);

        let cart = CartStore::open(JsonFileStorage::new(dir.path()));
        assert_eq!(cart.items_count(), 2);
        assert_eq!(cart.total(), Clp::new(49980));
        assert_eq!(
            cart.items().first().unwrap().selected_size.as_deref(),
            Some("M")
        );
    }

    #[test]
    fn test_file_format_is_plain_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = CartStore::open(JsonFileStorage::new(dir.path().join("nested").as_path()));
        cart.add_item(&vestido(), Some("S"));

        let raw = std::fs::read_to_string(cart.storage().path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "id": 7,
                "name": "Vestido floral",
                "price": 24990,
                "image_url": "https://cdn.febeflo.cl/vestido.jpg",
                "category": "Mujeres",
                "quantity": 1,
                "selectedSize": "S"
            }])
        );
    }

    #[test]
    fn test_corrupt_file_is_an_error_and_cart_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        std::fs::write(storage.path(), b"{not json").unwrap();

        assert!(matches!(
            storage.load(),
            Err(StorageError::Serialization(_))
        ));
        assert!(CartStore::open(storage).is_empty());
    }
}
