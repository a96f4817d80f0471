//! Bazaar server library.
//!
//! This crate provides the backend functionality as a library, allowing the
//! router and services to be exercised in tests without a running binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
