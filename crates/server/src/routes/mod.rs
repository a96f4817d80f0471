//! HTTP route handlers for the Bazaar API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health            - Liveness check
//! GET    /health/ready      - Readiness check (verifies database)
//!
//! # Products (public)
//! GET    /products          - Paginated product listing
//! POST   /products          - Create a product
//! GET    /products/{id}     - Product detail
//! PUT    /products/{id}     - Update a product
//! DELETE /products/{id}     - Delete a product
//!
//! # Auth
//! POST   /auth/register     - Register, returns user + token pair
//! POST   /auth/token        - Login, returns user + token pair
//! POST   /auth/refresh      - Exchange refresh token for access token
//!
//! # Cart (requires Bearer token)
//! GET    /cart              - List line items
//! POST   /cart              - Add a product (merges on repeat add)
//! PUT    /cart/{item_id}    - Set a line item's quantity
//! DELETE /cart/{item_id}    - Remove a line item
//! ```

pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        // In-memory state has no external dependencies to probe.
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/token", post(auth::token))
        .route("/refresh", post(auth::refresh))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{item_id}", put(cart::update).delete(cart::remove))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
}
