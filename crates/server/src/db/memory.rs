//! In-memory implementations of the store contracts.
//!
//! These back the unit and router tests. They mirror the Postgres
//! implementations' semantics, in particular the two uniqueness rules (one
//! cart per user, one line item per `(cart, product)`) and insertion-ordered
//! listing. Each operation takes one lock over the whole state, which makes
//! `get_or_create_cart` and `upsert_item` atomic the same way the Postgres
//! `ON CONFLICT` statements are.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use bazaar_core::{CartId, CartItemId, ProductId, Quantity, UserId};

use crate::models::{Cart, CartItem, NewProduct, NewUser, Product, User};
use crate::services::auth::UserStore;
use crate::services::cart::CartStore;
use crate::services::catalog::ProductCatalog;

use super::RepositoryError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Cart store
// =============================================================================

#[derive(Default)]
struct CartState {
    carts: Vec<Cart>,
    items: Vec<CartItem>,
    next_cart_id: i32,
    next_item_id: i32,
}

/// In-memory [`CartStore`].
#[derive(Default)]
pub struct MemoryCartStore {
    state: Mutex<CartState>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of carts in the store. Test hook for the one-cart-per-user
    /// invariant.
    #[must_use]
    pub fn cart_count(&self) -> usize {
        lock(&self.state).carts.len()
    }
}

impl CartState {
    fn create_cart(&mut self, owner: UserId) -> Result<Cart, RepositoryError> {
        if self.carts.iter().any(|c| c.owner == owner) {
            return Err(RepositoryError::Conflict(format!(
                "cart already exists for user {owner}"
            )));
        }
        self.next_cart_id += 1;
        let cart = Cart {
            id: CartId::new(self.next_cart_id),
            owner,
            created_at: Utc::now(),
        };
        self.carts.push(cart.clone());
        Ok(cart)
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn get_cart(&self, owner: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(lock(&self.state)
            .carts
            .iter()
            .find(|c| c.owner == owner)
            .cloned())
    }

    async fn create_cart(&self, owner: UserId) -> Result<Cart, RepositoryError> {
        lock(&self.state).create_cart(owner)
    }

    async fn get_or_create_cart(&self, owner: UserId) -> Result<Cart, RepositoryError> {
        // One lock for the whole check-then-create, so racing callers
        // serialize here just like on the database's unique constraint.
        let mut state = lock(&self.state);
        if let Some(cart) = state.carts.iter().find(|c| c.owner == owner) {
            return Ok(cart.clone());
        }
        state.create_cart(owner)
    }

    async fn find_item(
        &self,
        cart: CartId,
        product: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        Ok(lock(&self.state)
            .items
            .iter()
            .find(|i| i.cart_id == cart && i.product_id == product)
            .cloned())
    }

    async fn list_items(&self, cart: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(lock(&self.state)
            .items
            .iter()
            .filter(|i| i.cart_id == cart)
            .cloned()
            .collect())
    }

    async fn upsert_item(
        &self,
        cart: CartId,
        product: ProductId,
        quantity_if_new: Quantity,
    ) -> Result<(CartItem, bool), RepositoryError> {
        let mut state = lock(&self.state);
        if let Some(existing) = state
            .items
            .iter()
            .find(|i| i.cart_id == cart && i.product_id == product)
        {
            return Ok((existing.clone(), false));
        }
        state.next_item_id += 1;
        let item = CartItem {
            id: CartItemId::new(state.next_item_id),
            cart_id: cart,
            product_id: product,
            quantity: quantity_if_new,
            created_at: Utc::now(),
        };
        state.items.push(item.clone());
        Ok((item, true))
    }

    async fn update_quantity(
        &self,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut state = lock(&self.state);
        let Some(found) = state.items.iter_mut().find(|i| i.id == item) else {
            return Err(RepositoryError::NotFound);
        };
        found.quantity = quantity;
        Ok(found.clone())
    }

    async fn increment_quantity(
        &self,
        item: CartItemId,
        delta: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        // Read and write under one lock so concurrent increments all apply.
        let mut state = lock(&self.state);
        let Some(found) = state.items.iter_mut().find(|i| i.id == item) else {
            return Err(RepositoryError::NotFound);
        };
        found.quantity = found.quantity.saturating_add(delta);
        Ok(found.clone())
    }

    async fn delete_item(&self, item: CartItemId) -> Result<(), RepositoryError> {
        lock(&self.state).items.retain(|i| i.id != item);
        Ok(())
    }

    async fn get_owned_item(
        &self,
        owner: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let state = lock(&self.state);
        let Some(found) = state.items.iter().find(|i| i.id == item) else {
            return Ok(None);
        };
        let owned = state
            .carts
            .iter()
            .any(|c| c.id == found.cart_id && c.owner == owner);
        Ok(owned.then(|| found.clone()))
    }
}

// =============================================================================
// Product catalog
// =============================================================================

#[derive(Default)]
struct CatalogState {
    products: Vec<Product>,
    next_id: i32,
}

/// In-memory [`ProductCatalog`].
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let state = lock(&self.state);
        let total = state.products.len() as i64;
        let page = state
            .products
            .iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(lock(&self.state)
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let product = Product {
            id: ProductId::new(state.next_id),
            name: product.name,
            price: product.price,
            description: product.description,
            stock: product.stock,
            created_at: Utc::now(),
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut state = lock(&self.state);
        let Some(found) = state.products.iter_mut().find(|p| p.id == id) else {
            return Err(RepositoryError::NotFound);
        };
        found.name = product.name;
        found.price = product.price;
        found.description = product.description;
        found.stock = product.stock;
        Ok(found.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state);
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(state.products.len() < before)
    }
}

// =============================================================================
// User store
// =============================================================================

#[derive(Default)]
struct UserState {
    users: Vec<(User, String)>,
    next_id: i32,
}

/// In-memory [`UserStore`].
#[derive(Default)]
pub struct MemoryUserStore {
    state: Mutex<UserState>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = lock(&self.state);
        if state.users.iter().any(|(u, _)| u.username == user.username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }
        state.next_id += 1;
        let created = User {
            id: UserId::new(state.next_id),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: Utc::now(),
        };
        state.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.state)
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }

    async fn get_with_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(lock(&self.state)
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .cloned())
    }
}
