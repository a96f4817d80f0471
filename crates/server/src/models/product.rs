//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::ProductId;

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price. Serialized as a decimal string.
    pub price: Decimal,
    /// Free-form description.
    pub description: String,
    /// Units on hand. Informational only; adds are not stock-capped.
    pub stock: i32,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub stock: i32,
}
