//! Business services for the Bazaar backend.
//!
//! - [`cart`] - The cart service and its store contract (the core)
//! - [`catalog`] - The product catalog contract
//! - [`auth`] - Registration, credential verification, and JWT issuance

pub mod auth;
pub mod cart;
pub mod catalog;

pub use auth::AuthService;
pub use cart::{AddStatus, CartError, CartService, CartStore};
pub use catalog::ProductCatalog;
