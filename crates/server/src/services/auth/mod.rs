//! Authentication service.
//!
//! Registration and login with argon2 password hashing, plus JWT
//! access/refresh token issuance. The cart service never sees any of this;
//! it only receives the already-authenticated `UserId`.

mod error;
mod tokens;

pub use error::AuthError;
pub use tokens::{Claims, TokenIssuer, TokenKind, TokenPair};

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;

use bazaar_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 150;

/// Durable user storage. Implemented by [`crate::db::users::PgUserStore`]
/// and [`crate::db::memory::MemoryUserStore`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. Fails with `Conflict` if the username is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Fetch a user by ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user and their password hash by username.
    async fn get_with_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// A registration request, validated here at the service boundary.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl AuthService {
    /// Create an auth service over the given user store and token issuer.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    /// Register a new user and issue their first token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername`, `AuthError::WeakPassword`, or
    /// `AuthError::InvalidEmail` for bad input, and
    /// `AuthError::UserAlreadyExists` for a taken username.
    pub async fn register(&self, reg: Registration) -> Result<(User, TokenPair), AuthError> {
        validate_username(&reg.username)?;
        validate_password(&reg.password)?;
        let email = reg.email.as_deref().map(Email::parse).transpose()?;

        let password_hash = hash_password(&reg.password)?;
        let user = self
            .users
            .create(NewUser {
                username: reg.username,
                password_hash,
                email,
                first_name: reg.first_name,
                last_name: reg.last_name,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let pair = self.tokens.issue_pair(user.id)?;
        Ok((user, pair))
    }

    /// Verify credentials and issue a token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown username or a
    /// wrong password, indistinguishably.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, TokenPair), AuthError> {
        let (user, password_hash) = self
            .users
            .get_with_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let pair = self.tokens.issue_pair(user.id)?;
        Ok((user, pair))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::TokenExpired`.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        self.tokens.refresh_access(refresh_token)
    }
}

/// Validate a username: non-empty, bounded, limited charset.
fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("must not be empty".to_owned()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AuthError::InvalidUsername(
            "may only contain letters, digits, and @ . + - _".to_owned(),
        ));
    }
    Ok(())
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a fresh salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use crate::db::memory::MemoryUserStore;

    use super::*;

    fn service() -> AuthService {
        let tokens = TokenIssuer::new(
            &SecretString::from("kX9#mP2$vL8@qR4!wN6^zT3&yH7*uJ1%"),
            Duration::from_secs(300),
            Duration::from_secs(86_400),
        );
        AuthService::new(Arc::new(MemoryUserStore::new()), tokens)
    }

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.to_owned(),
            password: "correct horse battery".to_owned(),
            email: Some("shopper@example.com".to_owned()),
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let (user, pair) = auth.register(registration("alice")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(!pair.access.is_empty());

        let (logged_in, _) = auth
            .login("alice", "correct horse battery")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let auth = service();
        auth.register(registration("alice")).await.unwrap();
        let err = auth.register(registration("alice")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let auth = service();
        auth.register(registration("alice")).await.unwrap();

        let err = auth.login("alice", "wrong password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth.login("nobody", "whatever!").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_rejects_weak_password() {
        let auth = service();
        let mut reg = registration("alice");
        reg.password = "short".to_owned();
        assert!(matches!(
            auth.register(reg).await.unwrap_err(),
            AuthError::WeakPassword(_)
        ));
    }

    #[tokio::test]
    async fn test_rejects_bad_username_and_email() {
        let auth = service();

        assert!(matches!(
            auth.register(registration("has spaces")).await.unwrap_err(),
            AuthError::InvalidUsername(_)
        ));

        let mut reg = registration("alice");
        reg.email = Some("not-an-email".to_owned());
        assert!(matches!(
            auth.register(reg).await.unwrap_err(),
            AuthError::InvalidEmail(_)
        ));
    }

    #[tokio::test]
    async fn test_refresh_flow() {
        let auth = service();
        let (user, pair) = auth.register(registration("alice")).await.unwrap();
        let access = auth.refresh(&pair.refresh).unwrap();
        assert_eq!(auth.tokens.verify_access(&access).unwrap(), user.id);
    }
}
