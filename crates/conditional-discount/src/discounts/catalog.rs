use std::sync::Mutex;

use super::domain::{CatalogProduct, ProductId};

/// Source of products offered in the rule editor's multi-select.
pub trait ProductCatalog: Send + Sync {
    fn products(&self) -> Result<Vec<CatalogProduct>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product catalog unavailable: {0}")]
    Unavailable(String),
}

/// Fixed catalog held in memory, listed in insertion order.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    products: Mutex<Vec<CatalogProduct>>,
}

impl StaticCatalog {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self {
            products: Mutex::new(products),
        }
    }

    pub fn insert(&self, id: ProductId, name: impl Into<String>) -> Result<(), CatalogError> {
        let mut products = self
            .products
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))?;
        let name = name.into();
        match products.iter_mut().find(|product| product.id == id) {
            Some(existing) => existing.name = name,
            None => products.push(CatalogProduct { id, name }),
        }
        Ok(())
    }
}

impl ProductCatalog for StaticCatalog {
    fn products(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
        self.products
            .lock()
            .map(|products| products.clone())
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))
    }
}
