//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{CartId, CartItemId, ProductId, Quantity, UserId};

use super::product::Product;

/// A user's cart. Exactly one per user, created lazily on first mutation
/// and never deleted or reassigned by this service.
#[derive(Debug, Clone)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// The owning user. Unique across carts.
    pub owner: UserId,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// A line item within a cart.
///
/// At most one item per `(cart, product)` pair; a repeat add merges into the
/// existing row instead of creating a duplicate.
#[derive(Debug, Clone)]
pub struct CartItem {
    /// Unique item ID.
    pub id: CartItemId,
    /// The cart this item belongs to.
    pub cart_id: CartId,
    /// The product this line refers to.
    pub product_id: ProductId,
    /// How many units. Always positive.
    pub quantity: Quantity,
    /// When the item was first added. Listing order follows insertion order.
    pub created_at: DateTime<Utc>,
}

/// A line item resolved to its product snapshot, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    /// The cart item ID (used for update/remove).
    pub id: CartItemId,
    /// Snapshot of the referenced product.
    pub product: Product,
    /// Units of the product in the cart.
    pub quantity: Quantity,
}

impl CartLine {
    /// Pair a cart item with its product snapshot.
    #[must_use]
    pub fn new(item: &CartItem, product: Product) -> Self {
        Self {
            id: item.id,
            product,
            quantity: item.quantity,
        }
    }
}
