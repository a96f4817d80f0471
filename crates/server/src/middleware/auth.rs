//! Authentication extractor.
//!
//! Requests carry a JWT access token in the `Authorization` header; the
//! extractor verifies it and hands the handler the authenticated user ID.
//! The cart service trusts this principal and never re-verifies identity.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};

use bazaar_core::UserId;

use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer` access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, user {user}!")
/// }
/// ```
pub struct CurrentUser(pub UserId);

/// Error returned when a request is not properly authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header was present.
    MissingToken,
    /// The token was invalid or expired.
    BadToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "Authentication credentials were not provided",
            Self::BadToken => "Invalid or expired token",
        };
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "message": message })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        let user = state.tokens().verify_access(token).map_err(|e| {
            if matches!(e, AuthError::TokenExpired) {
                tracing::debug!("rejected expired access token");
            }
            AuthRejection::BadToken
        })?;

        Ok(Self(user))
    }
}

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
