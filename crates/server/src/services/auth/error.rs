//! Authentication error types.

use thiserror::Error;

use bazaar_core::EmailError;

use crate::db::RepositoryError;

/// Errors from registration, login, and token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately one variant so the
    /// response cannot reveal which.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The username is already taken.
    #[error("username already taken")]
    UserAlreadyExists,

    /// The username failed validation.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// The password failed validation.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// The email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The token is malformed, has a bad signature, or is the wrong kind.
    #[error("invalid token")]
    InvalidToken,

    /// The token has expired.
    #[error("token expired")]
    TokenExpired,

    /// Password hashing or parsing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The user store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
