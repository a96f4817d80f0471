//! Product catalog contract.
//!
//! The cart service only needs `get`/`exists`; the product routes use the
//! full CRUD surface. Implemented by [`crate::db::products::PgProductCatalog`]
//! for production and [`crate::db::memory::MemoryCatalog`] for tests.

use async_trait::async_trait;

use bazaar_core::ProductId;

use crate::db::RepositoryError;
use crate::models::{NewProduct, Product};

/// Read/write access to product records.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// List products in ID order. Returns the page and the total count.
    async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError>;

    /// Fetch a product by ID.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Existence check keyed by product ID.
    async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.get(id).await?.is_some())
    }

    /// Create a new product.
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Replace an existing product. Fails with `NotFound` if absent.
    async fn update(&self, id: ProductId, product: NewProduct)
    -> Result<Product, RepositoryError>;

    /// Delete a product. Returns `false` if it did not exist.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;
}
