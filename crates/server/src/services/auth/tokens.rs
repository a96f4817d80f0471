//! JWT issuance and verification.
//!
//! Stateless HS256 tokens: a short-lived access token for request auth and a
//! longer-lived refresh token that can only mint new access tokens. The kind
//! is carried in the claims so one cannot stand in for the other.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use super::AuthError;

/// What a token is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Authenticates requests.
    Access,
    /// Mints new access tokens.
    Refresh,
}

/// The signed claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub sub: UserId,
    /// Expiry (unix seconds). Checked by the library on decode.
    pub exp: i64,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Access or refresh.
    pub kind: TokenKind,
}

/// An access/refresh token pair, as returned on registration and login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies JWTs with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from the configured secret and lifetimes.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access/refresh pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if signing fails.
    pub fn issue_pair(&self, user: UserId) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user, TokenKind::Access, self.access_ttl)?,
            refresh: self.issue(user, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    /// Verify an access token and return the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for an expired token and
    /// `AuthError::InvalidToken` for anything else wrong with it, including
    /// a refresh token presented as an access token.
    pub fn verify_access(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.verify(token, TokenKind::Access)?;
        Ok(claims.sub)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::verify_access`], with kinds swapped.
    pub fn refresh_access(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.verify(refresh_token, TokenKind::Refresh)?;
        self.issue(claims.sub, TokenKind::Access, self.access_ttl)
    }

    fn issue(&self, user: UserId, kind: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user,
            exp: now.saturating_add(ttl),
            iat: now,
            kind,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AuthError::InvalidToken)
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;
        if data.claims.kind != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            &SecretString::from("kX9#mP2$vL8@qR4!wN6^zT3&yH7*uJ1%"),
            Duration::from_secs(300),
            Duration::from_secs(86_400),
        )
    }

    #[test]
    fn test_access_token_roundtrip() {
        let issuer = issuer();
        let pair = issuer.issue_pair(UserId::new(7)).unwrap();
        assert_eq!(issuer.verify_access(&pair.access).unwrap(), UserId::new(7));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let issuer = issuer();
        let pair = issuer.issue_pair(UserId::new(7)).unwrap();
        assert!(matches!(
            issuer.verify_access(&pair.refresh),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_access_token_cannot_refresh() {
        let issuer = issuer();
        let pair = issuer.issue_pair(UserId::new(7)).unwrap();
        assert!(matches!(
            issuer.refresh_access(&pair.access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_refresh_yields_usable_access_token() {
        let issuer = issuer();
        let pair = issuer.issue_pair(UserId::new(9)).unwrap();
        let access = issuer.refresh_access(&pair.refresh).unwrap();
        assert_eq!(issuer.verify_access(&access).unwrap(), UserId::new(9));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Zero TTL puts exp in the past once the default leeway is exceeded;
        // build the claim by hand to get well past it.
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new(1),
            exp: now - 3600,
            iat: now - 7200,
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &issuer.encoding).unwrap();
        assert!(matches!(
            issuer.verify_access(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            issuer().verify_access("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = issuer().issue_pair(UserId::new(7)).unwrap();
        let other = TokenIssuer::new(
            &SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6j"),
            Duration::from_secs(300),
            Duration::from_secs(86_400),
        );
        assert!(matches!(
            other.verify_access(&pair.access),
            Err(AuthError::InvalidToken)
        ));
    }
}
