//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::carts::PgCartStore;
use crate::db::memory::{MemoryCartStore, MemoryCatalog, MemoryUserStore};
use crate::db::products::PgProductCatalog;
use crate::db::users::PgUserStore;
use crate::services::auth::{AuthService, TokenIssuer, UserStore};
use crate::services::cart::{CartService, CartStore};
use crate::services::catalog::ProductCatalog;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the store seams as trait objects so
/// the same router runs against Postgres in production and the in-memory
/// stores in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    catalog: Arc<dyn ProductCatalog>,
    cart: CartService,
    auth: AuthService,
    tokens: TokenIssuer,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let catalog: Arc<dyn ProductCatalog> = Arc::new(PgProductCatalog::new(pool.clone()));
        let carts: Arc<dyn CartStore> = Arc::new(PgCartStore::new(pool.clone()));
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        Self::assemble(config, catalog, carts, users, Some(pool))
    }

    /// Create application state backed by the in-memory stores.
    ///
    /// Used by the test suites to exercise the full router without a
    /// database.
    #[must_use]
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::assemble(
            config,
            Arc::new(MemoryCatalog::new()),
            Arc::new(MemoryCartStore::new()),
            Arc::new(MemoryUserStore::new()),
            None,
        )
    }

    fn assemble(
        config: ServerConfig,
        catalog: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
        users: Arc<dyn UserStore>,
        pool: Option<PgPool>,
    ) -> Self {
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        );
        let cart = CartService::new(carts, catalog.clone());
        let auth = AuthService::new(users, tokens.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                cart,
                auth,
                tokens,
                pool,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn ProductCatalog> {
        &self.inner.catalog
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get a reference to the auth service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    /// Get the database connection pool, if this state is Postgres-backed.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
