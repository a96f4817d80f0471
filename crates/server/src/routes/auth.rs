//! Registration and token handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::models::User;
use crate::services::auth::{Registration, TokenPair};
use crate::state::AppState;

/// Body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    password: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Body for `POST /auth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    username: String,
    password: String,
}

/// Body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    refresh: String,
}

/// The authenticated user together with a fresh token pair.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    user: User,
    #[serde(flatten)]
    tokens: TokenPair,
}

/// Response for `POST /auth/refresh`: a fresh access token.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    access: String,
}

/// `POST /auth/register` - create an account and log it in.
#[instrument(skip(state, req))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let (user, tokens) = state
        .auth()
        .register(Registration {
            username: req.username,
            password: req.password,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;
    tracing::info!(user = %user.id, "registered new user");
    Ok((StatusCode::CREATED, Json(SessionResponse { user, tokens })))
}

/// `POST /auth/token` - exchange credentials for a token pair.
#[instrument(skip(state, req))]
pub async fn token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<SessionResponse>> {
    let (user, tokens) = state.auth().login(&req.username, &req.password).await?;
    Ok(Json(SessionResponse { user, tokens }))
}

/// `POST /auth/refresh` - exchange a refresh token for a new access token.
#[instrument(skip(state, req))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AccessResponse>> {
    let access = state.auth().refresh(&req.refresh)?;
    Ok(Json(AccessResponse { access }))
}
