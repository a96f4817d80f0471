//! Bazaar Core - Shared types library.
//!
//! This crate provides common types used across the Bazaar components:
//! - `server` - The HTTP backend (catalog, auth, cart)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Database encodings for the ID newtypes are behind the `postgres` feature
//! so the `cli` and `server` crates can opt in.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, quantities, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
