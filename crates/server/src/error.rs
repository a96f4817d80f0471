//! Unified error handling.
//!
//! Provides a unified `AppError` type mapping the service-layer error
//! taxonomy onto HTTP. All route handlers return `Result<T, AppError>`.
//! Responses are a JSON object with a single `message` field; internal
//! detail never reaches the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;

/// Application-level error type for the Bazaar server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// HTTP status for a repository failure. Timeouts are transient (503);
/// everything else is an internal error.
const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn repository_message(err: &RepositoryError) -> String {
    // Fixed wording only; the store's own message goes to the log, not the
    // client.
    match err {
        RepositoryError::Unavailable(_) => "Service temporarily unavailable".to_owned(),
        RepositoryError::Conflict(_) => "Conflict with existing resource".to_owned(),
        _ => "Internal server error".to_owned(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            Self::Database(_) | Self::Cart(CartError::Store(_)) | Self::Auth(AuthError::Repository(_) | AuthError::Hash(_))
        ) {
            tracing::error!(error = %self, "Request error");
        }

        let status = match &self {
            Self::Database(err) => repository_status(err),
            Self::Cart(err) => match err {
                CartError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
                CartError::ProductNotFound(_) | CartError::ItemNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CartError::Store(store) => repository_status(store),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidUsername(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(store) => repository_status(store),
                AuthError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(err) => repository_message(err),
            Self::Cart(err) => match err {
                CartError::Store(store) => repository_message(store),
                other => other.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::Repository(store) => repository_message(store),
                AuthError::Hash(_) => "Internal server error".to_owned(),
                other => other.to_string(),
            },
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{CartItemId, ProductId, Quantity};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_owned());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_cart_error_status_codes() {
        let invalid = Quantity::new(0).unwrap_err();
        assert_eq!(
            get_status(CartError::InvalidQuantity(invalid).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CartError::ProductNotFound(ProductId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::ItemNotFound(CartItemId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::WeakPassword("too short".to_owned()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::TokenExpired.into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_transient_store_failure_is_503() {
        let err = RepositoryError::Unavailable(sqlx::Error::PoolTimedOut);
        assert_eq!(get_status(err.into()), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let err: AppError = RepositoryError::Database(sqlx::Error::RowNotFound).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_conflict_detail_not_leaked() {
        let err: AppError =
            RepositoryError::Conflict("cart item vanished during upsert".to_owned()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Conflict with existing resource");
    }
}
