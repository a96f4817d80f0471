//! Cart repository for database operations.
//!
//! The schema carries the two invariants the cart service depends on:
//! `carts.user_id` is unique (one cart per user) and `(cart_id, product_id)`
//! is unique on `cart_items` (one line item per product). `ON CONFLICT DO
//! NOTHING` turns both constraints into race-safe get-or-create operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{CartId, CartItemId, ProductId, Quantity, UserId};

use crate::models::{Cart, CartItem};
use crate::services::cart::CartStore;

use super::RepositoryError;

/// Postgres-backed [`CartStore`].
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            owner: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart item {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get_cart(&self, owner: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> =
            sqlx::query_as("SELECT id, user_id, created_at FROM carts WHERE user_id = $1")
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Cart::from))
    }

    async fn create_cart(&self, owner: UserId) -> Result<Cart, RepositoryError> {
        let row: CartRow = sqlx::query_as(
            "INSERT INTO carts (user_id)
             VALUES ($1)
             RETURNING id, user_id, created_at",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("cart already exists for user {owner}"));
            }
            RepositoryError::from(e)
        })?;

        Ok(row.into())
    }

    async fn get_or_create_cart(&self, owner: UserId) -> Result<Cart, RepositoryError> {
        // DO NOTHING instead of DO UPDATE so a racing loser gets no row back
        // and falls through to the select of the winner's cart.
        let inserted: Option<CartRow> = sqlx::query_as(
            "INSERT INTO carts (user_id)
             VALUES ($1)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING id, user_id, created_at",
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row.into());
        }

        self.get_cart(owner).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_item(
        &self,
        cart: CartId,
        product: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row: Option<CartItemRow> = sqlx::query_as(
            "SELECT id, cart_id, product_id, quantity, created_at
             FROM cart_items
             WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart)
        .bind(product)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartItem::try_from).transpose()
    }

    async fn list_items(&self, cart: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows: Vec<CartItemRow> = sqlx::query_as(
            "SELECT id, cart_id, product_id, quantity, created_at
             FROM cart_items
             WHERE cart_id = $1
             ORDER BY id",
        )
        .bind(cart)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    async fn upsert_item(
        &self,
        cart: CartId,
        product: ProductId,
        quantity_if_new: Quantity,
    ) -> Result<(CartItem, bool), RepositoryError> {
        let inserted: Option<CartItemRow> = sqlx::query_as(
            "INSERT INTO cart_items (cart_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id) DO NOTHING
             RETURNING id, cart_id, product_id, quantity, created_at",
        )
        .bind(cart)
        .bind(product)
        .bind(quantity_if_new.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((row.try_into()?, true));
        }

        // Lost the insert race (or the item simply existed): return the
        // existing row unmodified. If it vanished again in between, that is a
        // store-level race we cannot resolve here.
        match self.find_item(cart, product).await? {
            Some(item) => Ok((item, false)),
            None => Err(RepositoryError::Conflict(
                "cart item vanished during upsert".to_owned(),
            )),
        }
    }

    async fn update_quantity(
        &self,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let row: Option<CartItemRow> = sqlx::query_as(
            "UPDATE cart_items
             SET quantity = $2
             WHERE id = $1
             RETURNING id, cart_id, product_id, quantity, created_at",
        )
        .bind(item)
        .bind(quantity.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartItem::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    async fn increment_quantity(
        &self,
        item: CartItemId,
        delta: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        // The addition happens inside the UPDATE, so concurrent increments
        // serialize on the row lock and all apply. Widen to bigint and cap so
        // the sum saturates instead of tripping integer overflow.
        let row: Option<CartItemRow> = sqlx::query_as(
            "UPDATE cart_items
             SET quantity = LEAST(quantity::bigint + $2, 2147483647)::integer
             WHERE id = $1
             RETURNING id, cart_id, product_id, quantity, created_at",
        )
        .bind(item)
        .bind(i64::from(delta.as_i32()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartItem::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete_item(&self, item: CartItemId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_owned_item(
        &self,
        owner: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row: Option<CartItemRow> = sqlx::query_as(
            "SELECT i.id, i.cart_id, i.product_id, i.quantity, i.created_at
             FROM cart_items i
             JOIN carts c ON c.id = i.cart_id
             WHERE i.id = $1 AND c.user_id = $2",
        )
        .bind(item)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartItem::try_from).transpose()
    }
}
