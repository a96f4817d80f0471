//! Product repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::ProductId;

use crate::models::{NewProduct, Product};
use crate::services::catalog::ProductCatalog;

use super::RepositoryError;

/// Postgres-backed [`ProductCatalog`].
#[derive(Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Decimal,
    description: String,
    stock: i32,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            description: row.description,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, name, price, description, stock, created_at
             FROM products
             ORDER BY id
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, price, description, stock, created_at
             FROM products
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(
            "INSERT INTO products (name, price, description, stock)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, price, description, stock, created_at",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: ProductId,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "UPDATE products
             SET name = $2, price = $3, description = $4, stock = $5
             WHERE id = $1
             RETURNING id, name, price, description, stock, created_at",
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.stock)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
