//! Database operations for the Bazaar `PostgreSQL` store.
//!
//! # Tables
//!
//! - `users` - Accounts and credentials for JWT auth
//! - `products` - The catalog
//! - `carts` - One row per user, `UNIQUE (user_id)`
//! - `cart_items` - Line items, `UNIQUE (cart_id, product_id)`
//!
//! The two uniqueness constraints are load-bearing: they are what turns a
//! racing first-add into a merge instead of a duplicate (see
//! [`crate::services::cart`]).
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A query failed.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// The store could not be reached in time. Surfaced to callers as a
    /// transient failure; never retried here.
    #[error("store unavailable: {0}")]
    Unavailable(sqlx::Error),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row no longer exists (e.g. a race with a concurrent delete).
    #[error("not found")]
    NotFound,

    /// A stored value failed domain validation on the way out.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => Self::Unavailable(e),
            other => Self::Database(other),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
