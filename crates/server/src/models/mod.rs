//! Domain models for the Bazaar backend.
//!
//! These are validated domain objects, separate from database row types.

pub mod cart;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, CartLine};
pub use product::{NewProduct, Product};
pub use user::{NewUser, User};
