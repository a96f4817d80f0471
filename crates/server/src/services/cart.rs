//! The cart service: per-user carts with merge-on-add line items.
//!
//! Every operation is scoped to the authenticated user. The defining
//! behavior is the merge: re-adding a product that is already in the cart
//! increments the existing line item instead of creating a duplicate or
//! overwriting it.
//!
//! # Concurrency
//!
//! There are no locks here. Correctness under concurrent first-adds rests on
//! two store-level uniqueness constraints: one cart per user, one line item
//! per `(cart, product)`. A racing loser falls into the merge branch instead
//! of erroring; the race is a success path, never surfaced to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use bazaar_core::{CartId, CartItemId, ProductId, Quantity, QuantityError, UserId};

use crate::db::RepositoryError;
use crate::models::{Cart, CartItem, CartLine};

use super::catalog::ProductCatalog;

/// Durable cart storage.
///
/// Owns all `Cart` and `CartItem` records; the service only holds them for
/// the duration of a request. Implemented by
/// [`crate::db::carts::PgCartStore`] and [`crate::db::memory::MemoryCartStore`].
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Read-only lookup of a user's cart.
    async fn get_cart(&self, owner: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Create a cart for a user. Fails with `Conflict` if one already exists.
    async fn create_cart(&self, owner: UserId) -> Result<Cart, RepositoryError>;

    /// Fetch the user's cart, creating it if absent.
    ///
    /// Atomic with respect to concurrent callers for the same user: exactly
    /// one cart is ever created. The default implementation treats a create
    /// `Conflict` as "somebody else won, fetch theirs"; the Postgres
    /// implementation does it in a single statement.
    async fn get_or_create_cart(&self, owner: UserId) -> Result<Cart, RepositoryError> {
        if let Some(cart) = self.get_cart(owner).await? {
            return Ok(cart);
        }
        match self.create_cart(owner).await {
            Ok(cart) => Ok(cart),
            Err(RepositoryError::Conflict(_)) => {
                self.get_cart(owner).await?.ok_or(RepositoryError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Find the line item for a product within a cart.
    async fn find_item(
        &self,
        cart: CartId,
        product: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// List a cart's items in insertion order. A fresh snapshot each call.
    async fn list_items(&self, cart: CartId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Insert a line item, or return the existing one for this product
    /// unmodified. The boolean is `true` if a new row was created.
    async fn upsert_item(
        &self,
        cart: CartId,
        product: ProductId,
        quantity_if_new: Quantity,
    ) -> Result<(CartItem, bool), RepositoryError>;

    /// Set a line item's quantity. Fails with `NotFound` if the item was
    /// deleted in the meantime.
    async fn update_quantity(
        &self,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    /// Add `delta` to a line item's quantity, atomically in the store, and
    /// return the updated item. Concurrent increments on the same item must
    /// all be applied; the sum saturates at the quantity maximum. Fails with
    /// `NotFound` if the item was deleted in the meantime.
    async fn increment_quantity(
        &self,
        item: CartItemId,
        delta: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    /// Delete a line item. Idempotent; deleting an absent item is not an
    /// error (the service checks ownership before calling this).
    async fn delete_item(&self, item: CartItemId) -> Result<(), RepositoryError>;

    /// Fetch a line item by ID, but only if its cart belongs to `owner`.
    ///
    /// Returns `None` both for a missing item and for someone else's item so
    /// the service cannot leak existence across users.
    async fn get_owned_item(
        &self,
        owner: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError>;
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity was not a positive integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// The product being added does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart item does not exist, or belongs to another user. The two
    /// cases are deliberately indistinguishable.
    #[error("cart item {0} not found")]
    ItemNotFound(CartItemId),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Whether an add created a new line item or merged into an existing one.
///
/// Callers may treat both as success; the distinction is kept observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddStatus {
    /// A new line item was created.
    Created,
    /// The quantity was merged into an existing line item.
    Merged,
}

/// The cart service.
///
/// Stateless between requests; all shared mutable state lives in the store.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl CartService {
    /// Create a cart service over the given store and catalog.
    #[must_use]
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    /// List the user's cart as product-resolved line items.
    ///
    /// A user whose cart was never created gets an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store or catalog fails.
    pub async fn list(&self, owner: UserId) -> Result<Vec<CartLine>, CartError> {
        let Some(cart) = self.carts.get_cart(owner).await? else {
            return Ok(Vec::new());
        };

        let items = self.carts.list_items(cart.id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            lines.push(CartLine::new(&item, self.resolve_product(&item).await?));
        }
        Ok(lines)
    }

    /// Add a product to the user's cart, merging into an existing line item
    /// if one exists.
    ///
    /// `quantity` defaults to 1 when omitted. Validation happens before any
    /// write, so a rejected request never mutates state.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a non-positive quantity,
    /// `CartError::ProductNotFound` for an unknown product, and
    /// `CartError::Store` if the store fails.
    pub async fn add(
        &self,
        owner: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
    ) -> Result<(CartLine, AddStatus), CartError> {
        let quantity = match quantity {
            None => Quantity::ONE,
            Some(q) => Quantity::new(q)?,
        };

        let product = self
            .catalog
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let cart = self.carts.get_or_create_cart(owner).await?;
        let (item, created) = self.carts.upsert_item(cart.id, product_id, quantity).await?;

        if created {
            return Ok((CartLine::new(&item, product), AddStatus::Created));
        }

        // The item existed already (possibly because we lost a racing
        // first-add): accumulate instead of overwriting. The increment is a
        // delta applied in the store, so concurrent merges on the same item
        // cannot lose each other's additions.
        let item = match self.carts.increment_quantity(item.id, quantity).await {
            Ok(item) => item,
            Err(RepositoryError::NotFound) => return Err(CartError::ItemNotFound(item.id)),
            Err(e) => return Err(e.into()),
        };

        Ok((CartLine::new(&item, product), AddStatus::Merged))
    }

    /// Set a line item's quantity, or read it back if no quantity is given.
    ///
    /// An absent `quantity` is an explicit no-op: the item is returned
    /// unchanged ("update only if given").
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the item does not exist or
    /// belongs to another user (same error for both, by policy), and
    /// `CartError::InvalidQuantity` for a non-positive quantity.
    pub async fn set_quantity(
        &self,
        owner: UserId,
        item_id: CartItemId,
        quantity: Option<i32>,
    ) -> Result<CartLine, CartError> {
        let item = self
            .carts
            .get_owned_item(owner, item_id)
            .await?
            .ok_or(CartError::ItemNotFound(item_id))?;

        let item = match quantity {
            None => item,
            Some(q) => {
                let q = Quantity::new(q)?;
                match self.carts.update_quantity(item.id, q).await {
                    Ok(item) => item,
                    Err(RepositoryError::NotFound) => {
                        return Err(CartError::ItemNotFound(item_id));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let product = self.resolve_product(&item).await?;
        Ok(CartLine::new(&item, product))
    }

    /// Remove a line item from the user's cart.
    ///
    /// The existence/ownership check happens once, before the delete; the
    /// delete itself is idempotent at the store level.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` under the same merged-error policy
    /// as [`Self::set_quantity`].
    pub async fn remove(&self, owner: UserId, item_id: CartItemId) -> Result<(), CartError> {
        let item = self
            .carts
            .get_owned_item(owner, item_id)
            .await?
            .ok_or(CartError::ItemNotFound(item_id))?;

        self.carts.delete_item(item.id).await?;
        Ok(())
    }

    /// Resolve an item's product snapshot. A dangling product reference means
    /// the store lost referential integrity, so it is reported as corruption
    /// rather than a user-facing not-found.
    async fn resolve_product(
        &self,
        item: &CartItem,
    ) -> Result<crate::models::Product, CartError> {
        self.catalog.get(item.product_id).await?.ok_or_else(|| {
            CartError::Store(RepositoryError::DataCorruption(format!(
                "cart item {} references missing product {}",
                item.id, item.product_id
            )))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::db::memory::{MemoryCartStore, MemoryCatalog};
    use crate::models::NewProduct;

    use super::*;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            price: dec!(9.99),
            description: format!("{name} description"),
            stock: 100,
        }
    }

    struct Fixture {
        carts: Arc<MemoryCartStore>,
        service: CartService,
        tea: ProductId,
        coffee: ProductId,
    }

    async fn fixture() -> Fixture {
        let carts = Arc::new(MemoryCartStore::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let tea = catalog.create(new_product("tea")).await.unwrap().id;
        let coffee = catalog.create(new_product("coffee")).await.unwrap().id;
        let service = CartService::new(carts.clone(), catalog);
        Fixture {
            carts,
            service,
            tea,
            coffee,
        }
    }

    const ALICE: UserId = UserId::new(1);
    const BOB: UserId = UserId::new(2);

    #[tokio::test]
    async fn test_list_without_cart_is_empty() {
        let fx = fixture().await;
        assert!(fx.service.list(ALICE).await.unwrap().is_empty());
        // Reading must not create a cart as a side effect.
        assert!(fx.carts.get_cart(ALICE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_add_creates_cart_and_item() {
        let fx = fixture().await;
        let (line, status) = fx.service.add(ALICE, fx.tea, Some(2)).await.unwrap();
        assert_eq!(status, AddStatus::Created);
        assert_eq!(line.quantity.as_i32(), 2);
        assert_eq!(line.product.id, fx.tea);
        assert!(fx.carts.get_cart(ALICE).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_defaults_quantity_to_one() {
        let fx = fixture().await;
        let (line, _) = fx.service.add(ALICE, fx.tea, None).await.unwrap();
        assert_eq!(line.quantity, Quantity::ONE);
    }

    #[tokio::test]
    async fn test_repeat_add_merges_quantities() {
        let fx = fixture().await;
        let (first, status) = fx.service.add(ALICE, fx.tea, Some(1)).await.unwrap();
        assert_eq!(status, AddStatus::Created);

        let (second, status) = fx.service.add(ALICE, fx.tea, Some(2)).await.unwrap();
        assert_eq!(status, AddStatus::Merged);
        assert_eq!(second.id, first.id, "merge must reuse the line item");
        assert_eq!(second.quantity.as_i32(), 3);

        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines.len(), 1, "never two items for the same product");
        assert_eq!(lines[0].quantity.as_i32(), 3);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let fx = fixture().await;
        let missing = ProductId::new(9999);
        let err = fx.service.add(ALICE, missing, Some(1)).await.unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(id) if id == missing));
        // Failing before any write: no cart should have been created.
        assert!(fx.carts.get_cart(ALICE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let fx = fixture().await;
        for bad in [0, -1] {
            let err = fx.service.add(ALICE, fx.tea, Some(bad)).await.unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity(_)));
        }
        assert!(fx.service.list(ALICE).await.unwrap().is_empty());
        assert!(fx.carts.get_cart(ALICE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_quantity() {
        let fx = fixture().await;
        let (line, _) = fx.service.add(ALICE, fx.tea, Some(1)).await.unwrap();

        let updated = fx
            .service
            .set_quantity(ALICE, line.id, Some(5))
            .await
            .unwrap();
        assert_eq!(updated.quantity.as_i32(), 5);

        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines[0].quantity.as_i32(), 5);
    }

    #[tokio::test]
    async fn test_set_quantity_without_value_is_noop() {
        let fx = fixture().await;
        let (line, _) = fx.service.add(ALICE, fx.tea, Some(4)).await.unwrap();

        let read_back = fx.service.set_quantity(ALICE, line.id, None).await.unwrap();
        assert_eq!(read_back.quantity.as_i32(), 4);
    }

    #[tokio::test]
    async fn test_set_quantity_rejects_zero_and_leaves_state() {
        let fx = fixture().await;
        let (line, _) = fx.service.add(ALICE, fx.tea, Some(4)).await.unwrap();

        let err = fx
            .service
            .set_quantity(ALICE, line.id, Some(0))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(_)));

        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines[0].quantity.as_i32(), 4, "quantity must be unchanged");
    }

    #[tokio::test]
    async fn test_ownership_isolation() {
        let fx = fixture().await;
        let (line, _) = fx.service.add(ALICE, fx.tea, Some(1)).await.unwrap();

        // Bob cannot see, resize, or remove Alice's item; every probe gets
        // the same not-found as a genuinely missing item would.
        for quantity in [None, Some(3)] {
            let err = fx
                .service
                .set_quantity(BOB, line.id, quantity)
                .await
                .unwrap_err();
            assert!(matches!(err, CartError::ItemNotFound(_)));
        }
        let err = fx.service.remove(BOB, line.id).await.unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));

        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines[0].quantity.as_i32(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let fx = fixture().await;
        let (line, _) = fx.service.add(ALICE, fx.tea, Some(1)).await.unwrap();

        fx.service.remove(ALICE, line.id).await.unwrap();
        assert!(fx.service.list(ALICE).await.unwrap().is_empty());

        // A second remove fails the existence check, not the delete.
        let err = fx.service.remove(ALICE, line.id).await.unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let fx = fixture().await;
        fx.service.add(ALICE, fx.coffee, Some(1)).await.unwrap();
        fx.service.add(ALICE, fx.tea, Some(1)).await.unwrap();
        // Merging must not reorder.
        fx.service.add(ALICE, fx.coffee, Some(1)).await.unwrap();

        let lines = fx.service.list(ALICE).await.unwrap();
        let products: Vec<ProductId> = lines.iter().map(|l| l.product.id).collect();
        assert_eq!(products, vec![fx.coffee, fx.tea]);
    }

    #[tokio::test]
    async fn test_scenario_add_merge_remove() {
        let fx = fixture().await;

        let (line, _) = fx.service.add(ALICE, fx.tea, Some(1)).await.unwrap();
        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity.as_i32(), 1);

        fx.service.add(ALICE, fx.tea, Some(2)).await.unwrap();
        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity.as_i32(), 3);

        fx.service.remove(ALICE, line.id).await.unwrap();
        assert!(fx.service.list(ALICE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_first_adds_create_one_cart() {
        let fx = fixture().await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let service = fx.service.clone();
            let product = if i % 2 == 0 { fx.tea } else { fx.coffee };
            handles.push(tokio::spawn(async move {
                service.add(ALICE, product, Some(1)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fx.carts.cart_count(), 1, "exactly one cart per user");
        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines.len(), 2, "one line item per product, no duplicates");
    }

    #[tokio::test]
    async fn test_concurrent_merges_lose_no_increments() {
        let fx = fixture().await;
        fx.service.add(ALICE, fx.tea, Some(1)).await.unwrap();

        // Every merge is a delta in the store, so no addition may be lost to
        // another merge racing on the same line item.
        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = fx.service.clone();
            let tea = fx.tea;
            handles.push(tokio::spawn(
                async move { service.add(ALICE, tea, Some(2)).await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let lines = fx.service.list(ALICE).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity.as_i32(), 1 + 16 * 2);
    }
}
